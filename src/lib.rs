//! querylog - statement logging for database drivers
//!
//! Wraps any driver implementing the [`driver`] traits so that every
//! executed statement is logged with its parameters, and every failure is
//! logged with its error, while results and errors pass through untouched.

pub mod advice;
pub mod config;
pub mod driver;
pub mod logging;
pub mod utils;

pub use advice::{InstrumentedCommand, InstrumentedConnection};
pub use logging::{QueryLogger, RecordingLogger, TracingLogger};
