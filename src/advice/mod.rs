//! Aspect-oriented advice for cross-cutting concerns.
//!
//! This module provides wrapper types that add orthogonal behavior
//! (statement logging, error reporting) without touching the driver.
//!
//! # Architecture
//!
//! Advice is applied when the connection is composed, not inside drivers:
//!
//! ```ignore
//! // Plain driver connection
//! let conn = SqliteConnection::new("sqlite::memory:")?;
//!
//! // Apply advice
//! let mut conn = InstrumentedConnection::new(conn, Arc::new(TracingLogger::new()));
//!
//! // Use as normal - logging is a side channel
//! conn.open()?;
//! let mut cmd = conn.create_command();
//! cmd.set_command_text("SELECT 1");
//! cmd.execute_scalar()?;
//! ```
//!
//! # Available Advice
//!
//! - [`InstrumentedConnection`] - Hands out instrumented commands sharing one logger
//! - [`InstrumentedCommand`] - Logs each execution and its failure, if any

mod instrumented_command;
mod instrumented_connection;

pub use instrumented_command::InstrumentedCommand;
pub use instrumented_connection::InstrumentedConnection;
