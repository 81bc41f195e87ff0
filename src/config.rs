//! Configuration for instrumented connections.
//!
//! Supports YAML file and environment variable overrides.

use serde::Deserialize;
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Driver connection settings.
    pub connection: ConnectionConfig,
    /// Statement logging settings.
    pub instrumentation: InstrumentationConfig,
}

/// Driver connection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Driver connection string (sqlx SQLite URL for the bundled driver).
    pub connection_string: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connection_string: "sqlite::memory:".to_string(),
        }
    }
}

/// Statement logging settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InstrumentationConfig {
    /// Timeout in seconds applied to every command created. `None` keeps
    /// the driver default.
    pub command_timeout: Option<u32>,
    /// Parameters whose values are masked in log output.
    pub redacted_parameters: Vec<String>,
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. Config file
    /// 3. Defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("QUERYLOG_CONFIG").unwrap_or_else(|_| "querylog.yaml".to_string());

        let mut config = if Path::new(&config_path).exists() {
            Self::from_file(&config_path)?
        } else {
            Self::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;

        serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(connection_string) = std::env::var("QUERYLOG_CONNECTION_STRING") {
            self.connection.connection_string = connection_string;
        }

        if let Ok(timeout) = std::env::var("QUERYLOG_COMMAND_TIMEOUT") {
            if let Ok(t) = timeout.parse() {
                self.instrumentation.command_timeout = Some(t);
            }
        }

        if let Ok(names) = std::env::var("QUERYLOG_REDACT") {
            self.instrumentation.redacted_parameters = names
                .split(',')
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .collect();
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}': {1}")]
    FileRead(String, String),

    #[error("Failed to parse config: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn clear_env() {
        for key in [
            "QUERYLOG_CONFIG",
            "QUERYLOG_CONNECTION_STRING",
            "QUERYLOG_COMMAND_TIMEOUT",
            "QUERYLOG_REDACT",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.connection.connection_string, "sqlite::memory:");
        assert_eq!(config.instrumentation.command_timeout, None);
        assert!(config.instrumentation.redacted_parameters.is_empty());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
connection:
  connection_string: sqlite:///tmp/people.db?mode=rwc

instrumentation:
  command_timeout: 45
  redacted_parameters:
    - "@password"
    - token
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            config.connection.connection_string,
            "sqlite:///tmp/people.db?mode=rwc"
        );
        assert_eq!(config.instrumentation.command_timeout, Some(45));
        assert_eq!(
            config.instrumentation.redacted_parameters,
            vec!["@password", "token"]
        );
    }

    #[test]
    fn test_parse_partial_yaml_keeps_defaults() {
        let config: Config =
            serde_yaml::from_str("instrumentation:\n  command_timeout: 5\n").unwrap();
        assert_eq!(config.connection.connection_string, "sqlite::memory:");
        assert_eq!(config.instrumentation.command_timeout, Some(5));
    }

    #[test]
    fn test_from_file_missing() {
        let err = Config::from_file("/nonexistent/querylog.yaml").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::FileRead(path, _) if path == "/nonexistent/querylog.yaml"
        ));
    }

    #[test]
    fn test_from_file_invalid_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "instrumentation: [not, a, map").unwrap();

        let err = Config::from_file(file.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    #[serial]
    fn test_load_file_then_env_overrides() {
        clear_env();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "connection:\n  connection_string: sqlite://from-file.db").unwrap();
        writeln!(file, "instrumentation:\n  command_timeout: 10").unwrap();

        std::env::set_var("QUERYLOG_CONFIG", file.path());
        std::env::set_var("QUERYLOG_COMMAND_TIMEOUT", "20");
        std::env::set_var("QUERYLOG_REDACT", "@password, token,");

        let config = Config::load().unwrap();
        clear_env();

        assert_eq!(config.connection.connection_string, "sqlite://from-file.db");
        assert_eq!(config.instrumentation.command_timeout, Some(20));
        assert_eq!(
            config.instrumentation.redacted_parameters,
            vec!["@password", "token"]
        );
    }

    #[test]
    #[serial]
    fn test_load_without_file_uses_defaults() {
        clear_env();
        std::env::set_var("QUERYLOG_CONFIG", "/nonexistent/querylog.yaml");
        std::env::set_var("QUERYLOG_COMMAND_TIMEOUT", "not-a-number");

        let config = Config::load().unwrap();
        clear_env();

        assert_eq!(config.connection.connection_string, "sqlite::memory:");
        assert_eq!(config.instrumentation.command_timeout, None);
    }
}
