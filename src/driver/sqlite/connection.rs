//! SQLite connection.

use std::str::FromStr;
use std::sync::Arc;

use parking_lot::Mutex;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, Connection};
use tracing::{debug, warn};

use super::{block_on, Result, Session, SqliteCommand, SqliteError, SqliteTransaction};
use crate::driver::{ConnectionState, DbConnection, IsolationLevel};

/// A single SQLite session.
///
/// The connection string is a sqlx SQLite URL, e.g. `sqlite::memory:` or
/// `sqlite://data/app.db?mode=rwc`.
pub struct SqliteConnection {
    connection_string: String,
    options: SqliteConnectOptions,
    session: Arc<Mutex<Session>>,
    disposed: bool,
}

impl SqliteConnection {
    /// Create a closed connection. Fails if the connection string does not
    /// parse.
    pub fn new(connection_string: &str) -> Result<Self> {
        Ok(Self {
            connection_string: connection_string.to_string(),
            options: SqliteConnectOptions::from_str(connection_string)?,
            session: Arc::new(Mutex::new(Session::new()?)),
            disposed: false,
        })
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn release(&mut self) -> Result<()> {
        let mut session = self.session.lock();
        let Some(conn) = session.detach() else {
            return Ok(());
        };
        block_on(&session.runtime, 0, conn.close())?;
        debug!(data_source = %self.options.get_filename().display(), "Closed SQLite connection");
        Ok(())
    }
}

impl Drop for SqliteConnection {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!(error = %e, "Failed to close SQLite connection on drop");
        }
    }
}

impl DbConnection for SqliteConnection {
    type Error = SqliteError;
    type Transaction = SqliteTransaction;
    type Command = SqliteCommand;

    fn open(&mut self) -> Result<()> {
        if self.disposed {
            return Err(SqliteError::Disposed);
        }
        let mut session = self.session.lock();
        if session.is_open() {
            return Ok(());
        }
        let conn = block_on(&session.runtime, 0, self.options.connect())?;
        session.attach(conn);
        debug!(data_source = %self.options.get_filename().display(), "Opened SQLite connection");
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.release()
    }

    fn dispose(&mut self) -> Result<()> {
        if self.disposed {
            return Ok(());
        }
        self.disposed = true;
        self.release()
    }

    fn connection_string(&self) -> String {
        self.connection_string.clone()
    }

    fn set_connection_string(&mut self, connection_string: &str) -> Result<()> {
        if self.disposed {
            return Err(SqliteError::Disposed);
        }
        if self.session.lock().is_open() {
            return Err(SqliteError::AlreadyOpen);
        }
        self.options = SqliteConnectOptions::from_str(connection_string)?;
        self.connection_string = connection_string.to_string();
        Ok(())
    }

    fn database(&self) -> String {
        "main".to_string()
    }

    fn state(&self) -> ConnectionState {
        let session = self.session.lock();
        if session.is_open() {
            ConnectionState::Open
        } else if session.is_broken() {
            ConnectionState::Broken
        } else {
            ConnectionState::Closed
        }
    }

    fn data_source(&self) -> String {
        self.options.get_filename().display().to_string()
    }

    fn server_version(&self) -> Result<String> {
        let mut session = self.session.lock();
        let (runtime, conn) = session.connection()?;
        block_on(
            runtime,
            0,
            sqlx::query_scalar::<_, String>("select sqlite_version()").fetch_one(conn),
        )
    }

    fn change_database(&mut self, database: &str) -> Result<()> {
        Err(SqliteError::Unsupported(format!(
            "changing database to '{database}'"
        )))
    }

    fn begin_transaction(&mut self, isolation_level: IsolationLevel) -> Result<SqliteTransaction> {
        SqliteTransaction::begin(self.session.clone(), isolation_level)
    }

    fn create_command(&self) -> SqliteCommand {
        SqliteCommand::new(self.session.clone())
    }
}
