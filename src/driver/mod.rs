//! Database driver abstraction.
//!
//! These traits describe the capability surface an instrumented wrapper
//! consumes and re-exposes: a connection that produces commands and
//! transactions, a command that can be parameterized and executed, and a
//! cursor over result rows. All calls are synchronous and block until the
//! driver returns.
//!
//! Implementations:
//! - `SqliteConnection`: SQLite over sqlx (feature `sqlite`)
//! - `InstrumentedConnection`: logging decorator over any other implementation

mod types;

#[cfg(test)]
pub(crate) mod mock;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use types::{
    bare_parameter_name, CommandType, ConnectionState, IsolationLevel, Parameter,
    ParameterCollection, UpdateRowSource, Value, DEFAULT_COMMAND_TIMEOUT,
};

/// A session with a database.
pub trait DbConnection {
    type Error: std::error::Error + Send + Sync + 'static;
    type Transaction: DbTransaction<Error = Self::Error>;
    type Command: DbCommand<Error = Self::Error, Transaction = Self::Transaction>;

    fn open(&mut self) -> Result<(), Self::Error>;

    fn close(&mut self) -> Result<(), Self::Error>;

    /// Release the session for good. Idempotent; `Drop` performs the same
    /// release for connections that are never disposed explicitly.
    fn dispose(&mut self) -> Result<(), Self::Error>;

    fn connection_string(&self) -> String;

    fn set_connection_string(&mut self, connection_string: &str) -> Result<(), Self::Error>;

    /// Name of the current database.
    fn database(&self) -> String;

    fn state(&self) -> ConnectionState;

    /// Server or file the connection points at.
    fn data_source(&self) -> String;

    fn server_version(&self) -> Result<String, Self::Error>;

    fn change_database(&mut self, database: &str) -> Result<(), Self::Error>;

    fn begin_transaction(
        &mut self,
        isolation_level: IsolationLevel,
    ) -> Result<Self::Transaction, Self::Error>;

    fn begin_default_transaction(&mut self) -> Result<Self::Transaction, Self::Error> {
        self.begin_transaction(IsolationLevel::Unspecified)
    }

    /// Create a new command bound to this connection.
    fn create_command(&self) -> Self::Command;
}

/// A preparable, parameterized statement.
pub trait DbCommand {
    type Error: std::error::Error + Send + Sync + 'static;
    type Reader: DataReader<Error = Self::Error>;
    type Transaction;

    fn command_text(&self) -> &str;
    fn set_command_text(&mut self, text: &str);

    /// Timeout in seconds; `0` means no limit.
    fn command_timeout(&self) -> u32;
    fn set_command_timeout(&mut self, seconds: u32);

    fn command_type(&self) -> CommandType;
    fn set_command_type(&mut self, command_type: CommandType);

    fn updated_row_source(&self) -> UpdateRowSource;
    fn set_updated_row_source(&mut self, source: UpdateRowSource);

    fn design_time_visible(&self) -> bool;
    fn set_design_time_visible(&mut self, visible: bool);

    fn transaction(&self) -> Option<&Self::Transaction>;
    fn set_transaction(&mut self, transaction: Option<Self::Transaction>);

    fn parameters(&self) -> &ParameterCollection;
    fn parameters_mut(&mut self) -> &mut ParameterCollection;

    /// Create a parameter with driver defaults. It is not added to the
    /// command's collection.
    fn create_parameter(&self) -> Parameter;

    fn cancel(&self) -> Result<(), Self::Error>;

    fn prepare(&mut self) -> Result<(), Self::Error>;

    /// Execute and return the first column of the first row, or `Value::Null`.
    fn execute_scalar(&mut self) -> Result<Value, Self::Error>;

    /// Execute and return a cursor over the result rows.
    fn execute_reader(&mut self) -> Result<Self::Reader, Self::Error>;

    /// Execute and return the number of rows affected.
    fn execute_non_query(&mut self) -> Result<u64, Self::Error>;
}

/// A transaction started on a connection.
///
/// Handles are cheap to clone so they can be bound to several commands.
pub trait DbTransaction: Clone {
    type Error: std::error::Error + Send + Sync + 'static;

    fn isolation_level(&self) -> IsolationLevel;

    fn commit(&self) -> Result<(), Self::Error>;

    fn rollback(&self) -> Result<(), Self::Error>;
}

/// Forward-only cursor over result rows.
pub trait DataReader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Advance to the next row. Returns `false` once rows are exhausted.
    fn read(&mut self) -> Result<bool, Self::Error>;

    fn field_count(&self) -> usize;

    fn column_name(&self, ordinal: usize) -> Result<&str, Self::Error>;

    /// Value at `ordinal` in the current row.
    fn value(&self, ordinal: usize) -> Result<&Value, Self::Error>;

    fn is_null(&self, ordinal: usize) -> Result<bool, Self::Error> {
        Ok(self.value(ordinal)?.is_null())
    }

    fn get_i64(&self, ordinal: usize) -> Result<Option<i64>, Self::Error> {
        Ok(self.value(ordinal)?.as_i64())
    }

    fn get_f64(&self, ordinal: usize) -> Result<Option<f64>, Self::Error> {
        Ok(self.value(ordinal)?.as_f64())
    }

    fn get_string(&self, ordinal: usize) -> Result<Option<String>, Self::Error> {
        Ok(self.value(ordinal)?.as_str().map(str::to_string))
    }
}
