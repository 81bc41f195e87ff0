//! querylog-demo: statement logging against an in-memory SQLite database
//!
//! Opens an instrumented SQLite connection, runs a parameterized query and
//! then a broken one, so both the debug and the error record show up.
//!
//! ## Configuration
//! - QUERYLOG_CONFIG: YAML config file (default: querylog.yaml, optional)
//! - QUERYLOG_CONNECTION_STRING: sqlx SQLite URL (default: sqlite::memory:)
//! - QUERYLOG_COMMAND_TIMEOUT: command timeout in seconds
//! - QUERYLOG_REDACT: comma-separated parameter names to mask
//! - QUERYLOG_LOG: tracing filter (default: info,querylog::sql=debug)

use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};

use querylog::config::Config;
use querylog::driver::sqlite::SqliteConnection;
use querylog::driver::{DbCommand, DbConnection, Parameter};
use querylog::utils::bootstrap::init_tracing_with_default;
use querylog::{InstrumentedConnection, TracingLogger};

fn run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let inner = SqliteConnection::new(&config.connection.connection_string)?;
    let mut connection = InstrumentedConnection::from_config(
        inner,
        Arc::new(TracingLogger::new()),
        &config.instrumentation,
    );
    connection.open()?;
    info!(
        data_source = %connection.data_source(),
        server_version = %connection.server_version()?,
        "Connected"
    );

    let mut query = connection.create_command();
    query.set_command_text("SELECT @name, @age");
    query.parameters_mut().add_range([
        Parameter::new("@name", "Bob"),
        Parameter::new("@age", 28),
    ]);
    let result = query.execute_scalar()?;
    println!("{result}");

    let mut broken = connection.create_command();
    broken.set_command_text("SELEC_error 1");
    if let Err(e) = broken.execute_scalar() {
        info!(error = %e, "Broken statement failed as expected");
    }

    connection.dispose()?;
    Ok(())
}

fn main() -> ExitCode {
    init_tracing_with_default("info,querylog::sql=debug");

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "querylog-demo failed");
            ExitCode::FAILURE
        }
    }
}
