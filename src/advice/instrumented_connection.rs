//! Logging advice for a connection.

use std::sync::Arc;

use crate::config::InstrumentationConfig;
use crate::driver::{ConnectionState, DbCommand, DbConnection, IsolationLevel};
use crate::logging::{ParameterRedaction, QueryLogger};

use super::InstrumentedCommand;

/// Wrapper that hands out [`InstrumentedCommand`]s sharing one logger.
///
/// Lifecycle, metadata and transaction calls go straight to the inner
/// connection. Transactions are returned as the driver made them.
/// Dropping the wrapper drops (and so releases) the inner connection.
///
/// # Example
///
/// ```ignore
/// let conn = SqliteConnection::new("sqlite::memory:")?;
/// let mut conn = InstrumentedConnection::with_command_timeout(conn, logger, 60);
/// conn.open()?;
/// let mut cmd = conn.create_command();
/// ```
pub struct InstrumentedConnection<C> {
    inner: C,
    logger: Arc<dyn QueryLogger>,
    command_timeout: Option<u32>,
    redaction: ParameterRedaction,
}

impl<C: DbConnection> InstrumentedConnection<C> {
    pub fn new(inner: C, logger: Arc<dyn QueryLogger>) -> Self {
        Self {
            inner,
            logger,
            command_timeout: None,
            redaction: ParameterRedaction::none(),
        }
    }

    /// Wrap a connection whose commands get `seconds` as their timeout.
    pub fn with_command_timeout(inner: C, logger: Arc<dyn QueryLogger>, seconds: u32) -> Self {
        let mut connection = Self::new(inner, logger);
        connection.command_timeout = Some(seconds);
        connection
    }

    pub fn from_config(
        inner: C,
        logger: Arc<dyn QueryLogger>,
        config: &InstrumentationConfig,
    ) -> Self {
        let mut connection = Self::new(inner, logger)
            .redact_parameters(&config.redacted_parameters);
        connection.command_timeout = config.command_timeout;
        connection
    }

    /// Mask the values of the named parameters in every command's log output.
    pub fn redact_parameters<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.redaction = ParameterRedaction::new(names);
        self
    }

    pub fn command_timeout_override(&self) -> Option<u32> {
        self.command_timeout
    }

    /// Change the timeout applied to commands created from now on.
    /// Commands already handed out keep theirs.
    pub fn set_command_timeout_override(&mut self, seconds: Option<u32>) {
        self.command_timeout = seconds;
    }

    pub fn logger(&self) -> &Arc<dyn QueryLogger> {
        &self.logger
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut C {
        &mut self.inner
    }

    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C: DbConnection> DbConnection for InstrumentedConnection<C> {
    type Error = C::Error;
    type Transaction = C::Transaction;
    type Command = InstrumentedCommand<C::Command>;

    fn open(&mut self) -> Result<(), Self::Error> {
        self.inner.open()
    }

    fn close(&mut self) -> Result<(), Self::Error> {
        self.inner.close()
    }

    fn dispose(&mut self) -> Result<(), Self::Error> {
        self.inner.dispose()
    }

    fn connection_string(&self) -> String {
        self.inner.connection_string()
    }

    fn set_connection_string(&mut self, connection_string: &str) -> Result<(), Self::Error> {
        self.inner.set_connection_string(connection_string)
    }

    fn database(&self) -> String {
        self.inner.database()
    }

    fn state(&self) -> ConnectionState {
        self.inner.state()
    }

    fn data_source(&self) -> String {
        self.inner.data_source()
    }

    fn server_version(&self) -> Result<String, Self::Error> {
        self.inner.server_version()
    }

    fn change_database(&mut self, database: &str) -> Result<(), Self::Error> {
        self.inner.change_database(database)
    }

    fn begin_transaction(
        &mut self,
        isolation_level: IsolationLevel,
    ) -> Result<Self::Transaction, Self::Error> {
        self.inner.begin_transaction(isolation_level)
    }

    fn create_command(&self) -> Self::Command {
        let mut command = self.inner.create_command();
        if let Some(seconds) = self.command_timeout {
            command.set_command_timeout(seconds);
        }
        InstrumentedCommand::new(command, self.logger.clone())
            .with_redaction(self.redaction.clone())
    }
}
