//! SQLite transactions.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::{block_on, Result, Session, SqliteError};
use crate::driver::{DbTransaction, IsolationLevel};

/// Handle to an active SQLite transaction.
///
/// Clones share one transaction. If every handle is dropped while the
/// transaction is still active, it is rolled back. Closing the connection
/// ends the transaction; the handle then reports itself completed and never
/// touches a later session.
#[derive(Clone)]
pub struct SqliteTransaction {
    inner: Arc<TransactionInner>,
}

struct TransactionInner {
    session: Arc<Mutex<Session>>,
    generation: u64,
    isolation_level: IsolationLevel,
    completed: Mutex<bool>,
}

fn begin_statements(isolation_level: IsolationLevel) -> Result<&'static [&'static str]> {
    match isolation_level {
        IsolationLevel::Unspecified
        | IsolationLevel::ReadCommitted
        | IsolationLevel::RepeatableRead
        | IsolationLevel::Serializable => Ok(&["BEGIN IMMEDIATE"]),
        IsolationLevel::ReadUncommitted => Ok(&["PRAGMA read_uncommitted = 1", "BEGIN"]),
        other => Err(SqliteError::Unsupported(format!(
            "isolation level {other:?}"
        ))),
    }
}

impl SqliteTransaction {
    pub(crate) fn begin(
        session: Arc<Mutex<Session>>,
        isolation_level: IsolationLevel,
    ) -> Result<Self> {
        let statements = begin_statements(isolation_level)?;
        let generation = {
            let mut guard = session.lock();
            let (runtime, conn) = guard.connection()?;
            for sql in statements {
                block_on(runtime, 0, sqlx::query(sql).execute(&mut *conn))?;
            }
            guard.generation()
        };
        debug!(?isolation_level, "Began SQLite transaction");
        Ok(Self {
            inner: Arc::new(TransactionInner {
                session,
                generation,
                isolation_level,
                completed: Mutex::new(false),
            }),
        })
    }

    pub fn is_completed(&self) -> bool {
        *self.inner.completed.lock() || self.inner.is_stale(&self.inner.session.lock())
    }

    pub(crate) fn ensure_active(&self) -> Result<()> {
        if self.is_completed() {
            Err(SqliteError::TransactionCompleted)
        } else {
            Ok(())
        }
    }

    fn finish(&self, sql: &'static str) -> Result<()> {
        let mut completed = self.inner.completed.lock();
        if *completed {
            return Err(SqliteError::TransactionCompleted);
        }
        let mut session = self.inner.session.lock();
        if self.inner.is_stale(&session) {
            *completed = true;
            return Err(SqliteError::TransactionCompleted);
        }
        run(&mut session, sql)?;
        *completed = true;
        Ok(())
    }
}

fn run(session: &mut Session, sql: &'static str) -> Result<()> {
    let (runtime, conn) = session.connection()?;
    block_on(runtime, 0, sqlx::query(sql).execute(conn))?;
    Ok(())
}

impl TransactionInner {
    /// The connection this transaction began on has since been released.
    fn is_stale(&self, session: &Session) -> bool {
        session.generation() != self.generation
    }
}

impl Drop for TransactionInner {
    fn drop(&mut self) {
        if *self.completed.get_mut() {
            return;
        }
        let mut session = self.session.lock();
        if self.is_stale(&session) || !session.is_open() {
            return;
        }
        match run(&mut session, "ROLLBACK") {
            Ok(()) => debug!("Rolled back abandoned SQLite transaction"),
            Err(e) => warn!(error = %e, "Failed to roll back abandoned SQLite transaction"),
        }
    }
}

impl DbTransaction for SqliteTransaction {
    type Error = SqliteError;

    fn isolation_level(&self) -> IsolationLevel {
        self.inner.isolation_level
    }

    fn commit(&self) -> Result<()> {
        self.finish("COMMIT")
    }

    fn rollback(&self) -> Result<()> {
        self.finish("ROLLBACK")
    }
}
