//! SQLite command.

use std::sync::Arc;

use parking_lot::Mutex;
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments};
use sqlx::Executor;

use super::placeholders::{rewrite_named_placeholders, RewrittenStatement};
use super::reader::{decode_column, SqliteDataReader};
use super::{block_on, Result, Session, SqliteError, SqliteTransaction};
use crate::driver::{
    CommandType, DbCommand, Parameter, ParameterCollection, UpdateRowSource, Value,
    DEFAULT_COMMAND_TIMEOUT,
};

/// A statement bound to a `SqliteConnection`.
pub struct SqliteCommand {
    session: Arc<Mutex<Session>>,
    command_text: String,
    command_timeout: u32,
    command_type: CommandType,
    updated_row_source: UpdateRowSource,
    design_time_visible: bool,
    transaction: Option<SqliteTransaction>,
    parameters: ParameterCollection,
}

/// Statement text and argument values ready for sqlx.
struct Prepared {
    sql: String,
    values: Vec<Value>,
}

fn build_query<'q>(sql: &'q str, values: &'q [Value]) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    values
        .iter()
        .fold(sqlx::query(sql), |query, value| match value {
            Value::Null => query.bind(None::<i64>),
            Value::Integer(v) => query.bind(*v),
            Value::Real(v) => query.bind(*v),
            Value::Text(v) => query.bind(v.as_str()),
            Value::Blob(v) => query.bind(v.as_slice()),
        })
}

impl SqliteCommand {
    pub(crate) fn new(session: Arc<Mutex<Session>>) -> Self {
        Self {
            session,
            command_text: String::new(),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            command_type: CommandType::Text,
            updated_row_source: UpdateRowSource::default(),
            design_time_visible: true,
            transaction: None,
            parameters: ParameterCollection::new(),
        }
    }

    /// Rewrite placeholders and collect argument values in bind order.
    fn prepare_statement(&self) -> Result<Prepared> {
        if self.command_type != CommandType::Text {
            return Err(SqliteError::Unsupported(format!(
                "command type {:?}",
                self.command_type
            )));
        }
        if let Some(tx) = &self.transaction {
            tx.ensure_active()?;
        }

        let RewrittenStatement {
            sql,
            names,
            positional,
        } = rewrite_named_placeholders(&self.command_text);
        if positional && !names.is_empty() {
            return Err(SqliteError::Unsupported(
                "mixing named and positional placeholders".to_string(),
            ));
        }
        let values = if names.is_empty() {
            self.parameters.iter().map(|p| p.value.clone()).collect()
        } else {
            names
                .iter()
                .map(|name| {
                    self.parameters
                        .get(name)
                        .map(|p| p.value.clone())
                        .ok_or_else(|| SqliteError::MissingParameter(name.clone()))
                })
                .collect::<Result<_>>()?
        };
        Ok(Prepared { sql, values })
    }
}

impl DbCommand for SqliteCommand {
    type Error = SqliteError;
    type Reader = SqliteDataReader;
    type Transaction = SqliteTransaction;

    fn command_text(&self) -> &str {
        &self.command_text
    }

    fn set_command_text(&mut self, text: &str) {
        self.command_text = text.to_string();
    }

    fn command_timeout(&self) -> u32 {
        self.command_timeout
    }

    fn set_command_timeout(&mut self, seconds: u32) {
        self.command_timeout = seconds;
    }

    fn command_type(&self) -> CommandType {
        self.command_type
    }

    fn set_command_type(&mut self, command_type: CommandType) {
        self.command_type = command_type;
    }

    fn updated_row_source(&self) -> UpdateRowSource {
        self.updated_row_source
    }

    fn set_updated_row_source(&mut self, source: UpdateRowSource) {
        self.updated_row_source = source;
    }

    fn design_time_visible(&self) -> bool {
        self.design_time_visible
    }

    fn set_design_time_visible(&mut self, visible: bool) {
        self.design_time_visible = visible;
    }

    fn transaction(&self) -> Option<&SqliteTransaction> {
        self.transaction.as_ref()
    }

    fn set_transaction(&mut self, transaction: Option<SqliteTransaction>) {
        self.transaction = transaction;
    }

    fn parameters(&self) -> &ParameterCollection {
        &self.parameters
    }

    fn parameters_mut(&mut self) -> &mut ParameterCollection {
        &mut self.parameters
    }

    fn create_parameter(&self) -> Parameter {
        Parameter::default()
    }

    /// Statements on this driver run to completion; there is nothing to
    /// interrupt.
    fn cancel(&self) -> Result<()> {
        Ok(())
    }

    fn prepare(&mut self) -> Result<()> {
        let prepared = self.prepare_statement()?;
        let mut session = self.session.lock();
        let (runtime, conn) = session.connection()?;
        let result = block_on(runtime, self.command_timeout, conn.prepare(prepared.sql.as_str()));
        session.discard_on_timeout(result)?;
        Ok(())
    }

    fn execute_scalar(&mut self) -> Result<Value> {
        let prepared = self.prepare_statement()?;
        let mut session = self.session.lock();
        let (runtime, conn) = session.connection()?;
        let result = block_on(
            runtime,
            self.command_timeout,
            build_query(&prepared.sql, &prepared.values).fetch_optional(conn),
        );
        let row = session.discard_on_timeout(result)?;
        match row {
            Some(row) if !sqlx::Row::is_empty(&row) => decode_column(&row, 0),
            _ => Ok(Value::Null),
        }
    }

    fn execute_reader(&mut self) -> Result<SqliteDataReader> {
        let prepared = self.prepare_statement()?;
        let mut session = self.session.lock();
        let (runtime, conn) = session.connection()?;
        let result = block_on(
            runtime,
            self.command_timeout,
            build_query(&prepared.sql, &prepared.values).fetch_all(conn),
        );
        let rows = session.discard_on_timeout(result)?;
        SqliteDataReader::from_rows(&rows)
    }

    fn execute_non_query(&mut self) -> Result<u64> {
        let prepared = self.prepare_statement()?;
        let mut session = self.session.lock();
        let (runtime, conn) = session.connection()?;
        let result = block_on(
            runtime,
            self.command_timeout,
            build_query(&prepared.sql, &prepared.values).execute(conn),
        );
        let done = session.discard_on_timeout(result)?;
        Ok(done.rows_affected())
    }
}
