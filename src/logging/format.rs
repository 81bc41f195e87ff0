//! Message composition for instrumented executions.

use std::error::Error;
use std::fmt::{self, Write as _};
use std::time::Duration;

use super::redaction::{ParameterRedaction, REDACTED};
use crate::driver::{ParameterCollection, Value};

/// Which execution entry point ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionKind {
    Scalar,
    Reader,
    NonQuery,
}

impl ExecutionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionKind::Scalar => "Scalar",
            ExecutionKind::Reader => "Reader",
            ExecutionKind::NonQuery => "NonQuery",
        }
    }
}

impl fmt::Display for ExecutionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Describe a statement about to run.
///
/// `Scalar command: SELECT @name, @age; parameters: [@name='Bob', @age=28]`
///
/// The statement text is included verbatim.
pub fn describe_command(
    kind: ExecutionKind,
    text: &str,
    parameters: &ParameterCollection,
    redaction: &ParameterRedaction,
) -> String {
    let mut out = format!("{kind} command: {text}; parameters: [");
    for (i, parameter) in parameters.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&parameter.name);
        out.push('=');
        if redaction.is_redacted(&parameter.name) {
            out.push_str(REDACTED);
        } else {
            push_value(&mut out, &parameter.value);
        }
    }
    out.push(']');
    out
}

fn push_value(out: &mut String, value: &Value) {
    match value {
        Value::Text(text) => {
            out.push('\'');
            out.push_str(text);
            out.push('\'');
        }
        // Writing to a String cannot fail.
        other => {
            let _ = write!(out, "{other}");
        }
    }
}

/// Describe a failed execution, including the error's source chain.
pub fn describe_failure(description: &str, error: &dyn Error, elapsed: Duration) -> String {
    let mut out = format!(
        "{description}; failed after {} ms: {error}",
        elapsed.as_millis()
    );
    let mut source = error.source();
    while let Some(cause) = source {
        let _ = write!(out, "; caused by: {cause}");
        source = cause.source();
    }
    out
}
