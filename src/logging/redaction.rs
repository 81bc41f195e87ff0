//! Opt-in masking of parameter values in log text.

use std::collections::HashSet;

use crate::driver::bare_parameter_name;

/// Replacement text for a redacted value.
pub const REDACTED: &str = "***";

/// Set of parameter names whose values are masked in log messages.
///
/// Names match case-insensitively and ignore the placeholder prefix, so
/// `"password"` masks `@Password` and `:password` alike. Only the log text
/// is affected; the driver still receives the real value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterRedaction {
    names: HashSet<String>,
}

impl ParameterRedaction {
    /// No redaction.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names
                .into_iter()
                .map(|n| normalize(n.as_ref()))
                .filter(|n| !n.is_empty())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn is_redacted(&self, parameter_name: &str) -> bool {
        !self.names.is_empty() && self.names.contains(&normalize(parameter_name))
    }
}

fn normalize(name: &str) -> String {
    bare_parameter_name(name.trim()).to_ascii_lowercase()
}
