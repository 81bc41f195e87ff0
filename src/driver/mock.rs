//! Mock driver for testing.
//!
//! Every trait call is recorded so tests can check that wrappers forward
//! exactly what they were given.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::{
    CommandType, ConnectionState, DataReader, DbCommand, DbConnection, DbTransaction,
    IsolationLevel, Parameter, ParameterCollection, UpdateRowSource, Value,
    DEFAULT_COMMAND_TIMEOUT,
};

static NEXT_TRANSACTION_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct MockError(String);

impl MockError {
    pub fn new(message: &str) -> Self {
        Self(message.to_string())
    }
}

#[derive(Debug, Default)]
struct ConnectionProbeState {
    connection_string: String,
    database: String,
    state: ConnectionState,
    disposed: bool,
    dropped: bool,
    fail_with: Option<MockError>,
    last_transaction_id: Option<u64>,
    calls: Vec<String>,
}

/// Shared view of a [`MockConnection`] that outlives it.
#[derive(Debug, Clone, Default)]
pub struct ConnectionProbe(Arc<Mutex<ConnectionProbeState>>);

impl ConnectionProbe {
    pub fn calls(&self) -> Vec<String> {
        self.0.lock().calls.clone()
    }

    pub fn fail_with(&self, error: MockError) {
        self.0.lock().fail_with = Some(error);
    }

    pub fn state(&self) -> ConnectionState {
        self.0.lock().state
    }

    pub fn is_disposed(&self) -> bool {
        self.0.lock().disposed
    }

    pub fn is_dropped(&self) -> bool {
        self.0.lock().dropped
    }

    pub fn last_transaction_id(&self) -> Option<u64> {
        self.0.lock().last_transaction_id
    }

    fn record(&self, call: impl Into<String>) -> Result<(), MockError> {
        let mut state = self.0.lock();
        state.calls.push(call.into());
        match &state.fail_with {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

pub struct MockConnection {
    probe: ConnectionProbe,
}

impl MockConnection {
    pub fn new(connection_string: &str) -> Self {
        let probe = ConnectionProbe::default();
        {
            let mut state = probe.0.lock();
            state.connection_string = connection_string.to_string();
            state.database = "main".to_string();
        }
        Self { probe }
    }

    pub fn probe(&self) -> ConnectionProbe {
        self.probe.clone()
    }
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        let mut state = self.probe.0.lock();
        state.state = ConnectionState::Closed;
        state.dropped = true;
    }
}

impl DbConnection for MockConnection {
    type Error = MockError;
    type Transaction = MockTransaction;
    type Command = MockCommand;

    fn open(&mut self) -> Result<(), MockError> {
        self.probe.record("open")?;
        self.probe.0.lock().state = ConnectionState::Open;
        Ok(())
    }

    fn close(&mut self) -> Result<(), MockError> {
        self.probe.record("close")?;
        self.probe.0.lock().state = ConnectionState::Closed;
        Ok(())
    }

    fn dispose(&mut self) -> Result<(), MockError> {
        self.probe.record("dispose")?;
        let mut state = self.probe.0.lock();
        state.state = ConnectionState::Closed;
        state.disposed = true;
        Ok(())
    }

    fn connection_string(&self) -> String {
        let _ = self.probe.record("connection_string");
        self.probe.0.lock().connection_string.clone()
    }

    fn set_connection_string(&mut self, connection_string: &str) -> Result<(), MockError> {
        self.probe
            .record(format!("set_connection_string({connection_string})"))?;
        self.probe.0.lock().connection_string = connection_string.to_string();
        Ok(())
    }

    fn database(&self) -> String {
        let _ = self.probe.record("database");
        self.probe.0.lock().database.clone()
    }

    fn state(&self) -> ConnectionState {
        let _ = self.probe.record("state");
        self.probe.0.lock().state
    }

    fn data_source(&self) -> String {
        let _ = self.probe.record("data_source");
        "mock-source".to_string()
    }

    fn server_version(&self) -> Result<String, MockError> {
        self.probe.record("server_version")?;
        Ok("mock 1.0".to_string())
    }

    fn change_database(&mut self, database: &str) -> Result<(), MockError> {
        self.probe.record(format!("change_database({database})"))?;
        self.probe.0.lock().database = database.to_string();
        Ok(())
    }

    fn begin_transaction(
        &mut self,
        isolation_level: IsolationLevel,
    ) -> Result<MockTransaction, MockError> {
        self.probe
            .record(format!("begin_transaction({isolation_level:?})"))?;
        let tx = MockTransaction::with_level(isolation_level);
        self.probe.0.lock().last_transaction_id = Some(tx.id());
        Ok(tx)
    }

    fn create_command(&self) -> MockCommand {
        let _ = self.probe.record("create_command");
        MockCommand::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum TransactionState {
    #[default]
    Active,
    Committed,
    RolledBack,
}

#[derive(Debug, Clone)]
pub struct MockTransaction {
    id: u64,
    isolation_level: IsolationLevel,
    state: Arc<Mutex<TransactionState>>,
}

impl Default for MockTransaction {
    fn default() -> Self {
        Self::with_level(IsolationLevel::Unspecified)
    }
}

impl MockTransaction {
    pub fn with_level(isolation_level: IsolationLevel) -> Self {
        Self {
            id: NEXT_TRANSACTION_ID.fetch_add(1, Ordering::Relaxed),
            isolation_level,
            state: Arc::default(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_committed(&self) -> bool {
        *self.state.lock() == TransactionState::Committed
    }

    fn complete(&self, outcome: TransactionState) -> Result<(), MockError> {
        let mut state = self.state.lock();
        if *state != TransactionState::Active {
            return Err(MockError::new("transaction already completed"));
        }
        *state = outcome;
        Ok(())
    }
}

impl DbTransaction for MockTransaction {
    type Error = MockError;

    fn isolation_level(&self) -> IsolationLevel {
        self.isolation_level
    }

    fn commit(&self) -> Result<(), MockError> {
        self.complete(TransactionState::Committed)
    }

    fn rollback(&self) -> Result<(), MockError> {
        self.complete(TransactionState::RolledBack)
    }
}

/// Command with public state; execution results are configured up front.
pub struct MockCommand {
    pub command_text: String,
    pub command_timeout: u32,
    pub command_type: CommandType,
    pub updated_row_source: UpdateRowSource,
    pub design_time_visible: bool,
    pub transaction: Option<MockTransaction>,
    pub parameters: ParameterCollection,
    pub scalar: Value,
    pub rows: Vec<Vec<Value>>,
    pub rows_affected: u64,
    pub fail_with: Option<MockError>,
    calls: Mutex<Vec<&'static str>>,
}

impl MockCommand {
    pub fn new() -> Self {
        Self {
            command_text: String::new(),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            command_type: CommandType::default(),
            updated_row_source: UpdateRowSource::default(),
            design_time_visible: false,
            transaction: None,
            parameters: ParameterCollection::new(),
            scalar: Value::Null,
            rows: Vec::new(),
            rows_affected: 0,
            fail_with: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// The parameter `create_parameter` hands out.
    pub fn factory_parameter() -> Parameter {
        Parameter::new("@mock", Value::Null)
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    fn record(&self, call: &'static str) -> Result<(), MockError> {
        self.calls.lock().push(call);
        match &self.fail_with {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

impl DbCommand for MockCommand {
    type Error = MockError;
    type Reader = MockReader;
    type Transaction = MockTransaction;

    fn command_text(&self) -> &str {
        &self.command_text
    }

    fn set_command_text(&mut self, text: &str) {
        let _ = self.record("set_command_text");
        self.command_text = text.to_string();
    }

    fn command_timeout(&self) -> u32 {
        self.command_timeout
    }

    fn set_command_timeout(&mut self, seconds: u32) {
        let _ = self.record("set_command_timeout");
        self.command_timeout = seconds;
    }

    fn command_type(&self) -> CommandType {
        self.command_type
    }

    fn set_command_type(&mut self, command_type: CommandType) {
        let _ = self.record("set_command_type");
        self.command_type = command_type;
    }

    fn updated_row_source(&self) -> UpdateRowSource {
        self.updated_row_source
    }

    fn set_updated_row_source(&mut self, source: UpdateRowSource) {
        let _ = self.record("set_updated_row_source");
        self.updated_row_source = source;
    }

    fn design_time_visible(&self) -> bool {
        self.design_time_visible
    }

    fn set_design_time_visible(&mut self, visible: bool) {
        let _ = self.record("set_design_time_visible");
        self.design_time_visible = visible;
    }

    fn transaction(&self) -> Option<&MockTransaction> {
        self.transaction.as_ref()
    }

    fn set_transaction(&mut self, transaction: Option<MockTransaction>) {
        self.transaction = transaction;
    }

    fn parameters(&self) -> &ParameterCollection {
        &self.parameters
    }

    fn parameters_mut(&mut self) -> &mut ParameterCollection {
        &mut self.parameters
    }

    fn create_parameter(&self) -> Parameter {
        let _ = self.record("create_parameter");
        Self::factory_parameter()
    }

    fn cancel(&self) -> Result<(), MockError> {
        self.record("cancel")
    }

    fn prepare(&mut self) -> Result<(), MockError> {
        self.record("prepare")
    }

    fn execute_scalar(&mut self) -> Result<Value, MockError> {
        self.record("execute_scalar")?;
        Ok(self.scalar.clone())
    }

    fn execute_reader(&mut self) -> Result<MockReader, MockError> {
        self.record("execute_reader")?;
        Ok(MockReader {
            rows: self.rows.clone(),
            current: None,
        })
    }

    fn execute_non_query(&mut self) -> Result<u64, MockError> {
        self.record("execute_non_query")?;
        Ok(self.rows_affected)
    }
}

#[derive(Debug)]
pub struct MockReader {
    rows: Vec<Vec<Value>>,
    current: Option<usize>,
}

impl DataReader for MockReader {
    type Error = MockError;

    fn read(&mut self) -> Result<bool, MockError> {
        let next = self.current.map_or(0, |i| i + 1);
        self.current = Some(next.min(self.rows.len()));
        Ok(next < self.rows.len())
    }

    fn field_count(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    fn column_name(&self, ordinal: usize) -> Result<&str, MockError> {
        if ordinal < self.field_count() {
            Ok("column")
        } else {
            Err(MockError::new("column out of range"))
        }
    }

    fn value(&self, ordinal: usize) -> Result<&Value, MockError> {
        self.current
            .and_then(|row| self.rows.get(row))
            .and_then(|row| row.get(ordinal))
            .ok_or_else(|| MockError::new("no current value"))
    }
}
