//! Logger capability consumed by the instrumented wrappers.
//!
//! The wrappers render complete messages themselves and hand the sink a
//! `(level, message)` pair. Sinks must tolerate concurrent calls; the
//! wrappers do no synchronization of their own.

pub mod format;
mod redaction;

use parking_lot::Mutex;
use tracing::Level;

pub use format::ExecutionKind;
pub use redaction::{ParameterRedaction, REDACTED};

/// Target used by [`TracingLogger`].
pub const SQL_TARGET: &str = "querylog::sql";

/// A sink for rendered log messages.
pub trait QueryLogger: Send + Sync {
    fn log(&self, level: Level, message: &str);

    fn is_enabled(&self, level: Level) -> bool;
}

/// Forwards messages to the `tracing` facade under [`SQL_TARGET`].
///
/// Filtering and output format come from whatever subscriber the
/// application installed (see `utils::bootstrap::init_tracing`).
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl TracingLogger {
    pub fn new() -> Self {
        Self
    }
}

impl QueryLogger for TracingLogger {
    fn log(&self, level: Level, message: &str) {
        match level {
            Level::TRACE => tracing::trace!(target: SQL_TARGET, "{}", message),
            Level::DEBUG => tracing::debug!(target: SQL_TARGET, "{}", message),
            Level::INFO => tracing::info!(target: SQL_TARGET, "{}", message),
            Level::WARN => tracing::warn!(target: SQL_TARGET, "{}", message),
            Level::ERROR => tracing::error!(target: SQL_TARGET, "{}", message),
        }
    }

    fn is_enabled(&self, level: Level) -> bool {
        match level {
            Level::TRACE => tracing::enabled!(target: SQL_TARGET, Level::TRACE),
            Level::DEBUG => tracing::enabled!(target: SQL_TARGET, Level::DEBUG),
            Level::INFO => tracing::enabled!(target: SQL_TARGET, Level::INFO),
            Level::WARN => tracing::enabled!(target: SQL_TARGET, Level::WARN),
            Level::ERROR => tracing::enabled!(target: SQL_TARGET, Level::ERROR),
        }
    }
}

/// A single captured log record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: Level,
    pub message: String,
}

/// In-memory sink that keeps every record, in order.
///
/// Useful for assertions against log output:
///
/// ```
/// use querylog::logging::{QueryLogger, RecordingLogger};
/// use tracing::Level;
///
/// let logger = RecordingLogger::new();
/// logger.log(Level::DEBUG, "SELECT 1");
/// assert_eq!(logger.count(Level::DEBUG), 1);
/// assert!(logger.joined(Level::DEBUG).contains("SELECT 1"));
/// ```
#[derive(Debug, Default)]
pub struct RecordingLogger {
    records: Mutex<Vec<LogRecord>>,
    disabled: Mutex<Vec<Level>>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `level` as disabled from `is_enabled`.
    pub fn disable(&self, level: Level) {
        let mut disabled = self.disabled.lock();
        if !disabled.contains(&level) {
            disabled.push(level);
        }
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// Messages logged at `level`, in order.
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.level == level)
            .map(|r| r.message.clone())
            .collect()
    }

    /// All messages at `level` concatenated, with newlines between them.
    pub fn joined(&self, level: Level) -> String {
        self.messages(level).join("\n")
    }

    pub fn count(&self, level: Level) -> usize {
        self.records
            .lock()
            .iter()
            .filter(|r| r.level == level)
            .count()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl QueryLogger for RecordingLogger {
    fn log(&self, level: Level, message: &str) {
        self.records.lock().push(LogRecord {
            level,
            message: message.to_string(),
        });
    }

    fn is_enabled(&self, level: Level) -> bool {
        !self.disabled.lock().contains(&level)
    }
}
