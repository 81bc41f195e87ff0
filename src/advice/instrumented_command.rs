//! Logging advice for a single command.

use std::sync::Arc;
use std::time::Instant;

use tracing::Level;

use crate::driver::{
    CommandType, DbCommand, Parameter, ParameterCollection, UpdateRowSource, Value,
};
use crate::logging::format::{describe_command, describe_failure};
use crate::logging::{ExecutionKind, ParameterRedaction, QueryLogger};

/// Wrapper that logs every execution of the wrapped command.
///
/// The three execution methods emit one debug record describing the
/// statement (text plus parameter names and values) before delegating, and
/// one error record if the delegated call fails. Results and errors come
/// back exactly as the inner command produced them. Every other member is
/// a plain passthrough.
///
/// # Example
///
/// ```ignore
/// let cmd = InstrumentedCommand::new(connection.create_command(), logger);
/// cmd.set_command_text("SELECT 1");
/// let one = cmd.execute_scalar()?;
/// ```
pub struct InstrumentedCommand<C> {
    inner: C,
    logger: Arc<dyn QueryLogger>,
    redaction: ParameterRedaction,
}

impl<C: DbCommand> InstrumentedCommand<C> {
    pub fn new(inner: C, logger: Arc<dyn QueryLogger>) -> Self {
        Self {
            inner,
            logger,
            redaction: ParameterRedaction::none(),
        }
    }

    /// Mask the values of the named parameters in log output.
    pub fn with_redaction(mut self, redaction: ParameterRedaction) -> Self {
        self.redaction = redaction;
        self
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

    pub fn logger(&self) -> &Arc<dyn QueryLogger> {
        &self.logger
    }

    fn instrument<T>(
        &mut self,
        kind: ExecutionKind,
        execute: impl FnOnce(&mut C) -> Result<T, C::Error>,
    ) -> Result<T, C::Error> {
        let debug_enabled = self.logger.is_enabled(Level::DEBUG);
        let error_enabled = self.logger.is_enabled(Level::ERROR);
        if !debug_enabled && !error_enabled {
            return execute(&mut self.inner);
        }

        let description = describe_command(
            kind,
            self.inner.command_text(),
            self.inner.parameters(),
            &self.redaction,
        );
        if debug_enabled {
            self.logger.log(Level::DEBUG, &description);
        }

        let start = Instant::now();
        let result = execute(&mut self.inner);

        if let Err(ref e) = result {
            if error_enabled {
                self.logger.log(
                    Level::ERROR,
                    &describe_failure(&description, e, start.elapsed()),
                );
            }
        }

        result
    }
}

impl<C: DbCommand> DbCommand for InstrumentedCommand<C> {
    type Error = C::Error;
    type Reader = C::Reader;
    type Transaction = C::Transaction;

    fn command_text(&self) -> &str {
        self.inner.command_text()
    }

    fn set_command_text(&mut self, text: &str) {
        self.inner.set_command_text(text)
    }

    fn command_timeout(&self) -> u32 {
        self.inner.command_timeout()
    }

    fn set_command_timeout(&mut self, seconds: u32) {
        self.inner.set_command_timeout(seconds)
    }

    fn command_type(&self) -> CommandType {
        self.inner.command_type()
    }

    fn set_command_type(&mut self, command_type: CommandType) {
        self.inner.set_command_type(command_type)
    }

    fn updated_row_source(&self) -> UpdateRowSource {
        self.inner.updated_row_source()
    }

    fn set_updated_row_source(&mut self, source: UpdateRowSource) {
        self.inner.set_updated_row_source(source)
    }

    fn design_time_visible(&self) -> bool {
        self.inner.design_time_visible()
    }

    fn set_design_time_visible(&mut self, visible: bool) {
        self.inner.set_design_time_visible(visible)
    }

    fn transaction(&self) -> Option<&Self::Transaction> {
        self.inner.transaction()
    }

    fn set_transaction(&mut self, transaction: Option<Self::Transaction>) {
        self.inner.set_transaction(transaction)
    }

    fn parameters(&self) -> &ParameterCollection {
        self.inner.parameters()
    }

    fn parameters_mut(&mut self) -> &mut ParameterCollection {
        self.inner.parameters_mut()
    }

    fn create_parameter(&self) -> Parameter {
        self.inner.create_parameter()
    }

    fn cancel(&self) -> Result<(), Self::Error> {
        self.inner.cancel()
    }

    fn prepare(&mut self) -> Result<(), Self::Error> {
        self.inner.prepare()
    }

    fn execute_scalar(&mut self) -> Result<Value, Self::Error> {
        self.instrument(ExecutionKind::Scalar, |inner| inner.execute_scalar())
    }

    fn execute_reader(&mut self) -> Result<Self::Reader, Self::Error> {
        self.instrument(ExecutionKind::Reader, |inner| inner.execute_reader())
    }

    fn execute_non_query(&mut self) -> Result<u64, Self::Error> {
        self.instrument(ExecutionKind::NonQuery, |inner| inner.execute_non_query())
    }
}
