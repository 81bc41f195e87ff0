//! SQLite implementation of the driver traits.
//!
//! Built on sqlx's SQLite driver. Each connection owns a current-thread
//! tokio runtime and blocks on it, so these types must not be used from
//! inside another async runtime.

mod command;
mod connection;
mod placeholders;
mod reader;
mod transaction;

use std::future::Future;
use std::time::Duration;

use sqlx::sqlite::SqliteConnection as RawConnection;
use tokio::runtime::Runtime;
use tracing::warn;

pub use command::SqliteCommand;
pub use connection::SqliteConnection;
pub use reader::SqliteDataReader;
pub use transaction::SqliteTransaction;

/// Result type for SQLite driver operations.
pub type Result<T> = std::result::Result<T, SqliteError>;

/// Errors raised by the SQLite driver.
#[derive(Debug, thiserror::Error)]
pub enum SqliteError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Connection is not open")]
    NotOpen,

    #[error("Connection has been disposed")]
    Disposed,

    #[error("Connection string cannot change while the connection is open")]
    AlreadyOpen,

    #[error("No value supplied for parameter {0}")]
    MissingParameter(String),

    #[error("Not supported by SQLite: {0}")]
    Unsupported(String),

    #[error("Command timed out after {0} s")]
    Timeout(u32),

    #[error("Transaction has already been committed or rolled back")]
    TransactionCompleted,

    #[error("Column ordinal {0} out of range")]
    ColumnOutOfRange(usize),

    #[error("No current row")]
    NoCurrentRow,

    #[error("Failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// State shared by a connection and every command and transaction it
/// creates.
///
/// `generation` changes whenever a connection is attached or released, so
/// a transaction can tell whether it still belongs to the live session.
pub(crate) struct Session {
    runtime: Runtime,
    conn: Option<RawConnection>,
    generation: u64,
    broken: bool,
}

impl Session {
    fn new() -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            runtime,
            conn: None,
            generation: 0,
            broken: false,
        })
    }

    fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    fn is_broken(&self) -> bool {
        self.broken
    }

    fn generation(&self) -> u64 {
        self.generation
    }

    fn attach(&mut self, conn: RawConnection) {
        self.conn = Some(conn);
        self.generation += 1;
        self.broken = false;
    }

    fn detach(&mut self) -> Option<RawConnection> {
        let conn = self.conn.take();
        if conn.is_some() {
            self.generation += 1;
        }
        conn
    }

    /// Borrow the runtime and the live connection together.
    fn connection(&mut self) -> Result<(&Runtime, &mut RawConnection)> {
        let Session { runtime, conn, .. } = self;
        let conn = conn.as_mut().ok_or(SqliteError::NotOpen)?;
        Ok((runtime, conn))
    }

    /// Abandon the connection after a statement overran its timeout.
    ///
    /// The statement keeps running on the sqlx worker, so the connection
    /// stays busy until it finishes. It is dropped without waiting and the
    /// session is marked broken; later calls fail with `NotOpen` until the
    /// connection is opened again.
    fn discard_on_timeout<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(SqliteError::Timeout(seconds)) = &result {
            if self.detach().is_some() {
                self.broken = true;
                warn!(seconds, "SQLite statement timed out, connection abandoned");
            }
        }
        result
    }
}

/// Drive `fut` to completion, bounded by `timeout_secs` unless it is 0.
fn block_on<T, F>(runtime: &Runtime, timeout_secs: u32, fut: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, sqlx::Error>>,
{
    if timeout_secs == 0 {
        return runtime.block_on(fut).map_err(SqliteError::from);
    }

    let limit = Duration::from_secs(u64::from(timeout_secs));
    runtime
        .block_on(async { tokio::time::timeout(limit, fut).await })
        .map_err(|_| SqliteError::Timeout(timeout_secs))?
        .map_err(SqliteError::from)
}
