//! Service configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional TOML
//! file, then `AWAKEY__`-prefixed environment variables
//! (e.g. `AWAKEY__DMS__DROWSINESS_THRESHOLD=6`).

use alerting::AlertConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use dms::{DmsConfig, DmsError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::Level;

/// Config file looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "awakey";

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "AWAKEY";

/// Settings that passed parsing but are unusable
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error(transparent)]
    Engine(#[from] DmsError),

    #[error("Unknown log level: {0:?}")]
    LogLevel(String),
}

/// Top-level service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    /// Engine settings used when a start request carries none
    pub dms: DmsConfig,
    pub alerting: AlertConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn or error
    pub level: String,
    /// Emit JSON lines instead of human-readable text
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl LoggingConfig {
    /// Parsed maximum log level
    pub fn max_level(&self) -> Result<Level, SettingsError> {
        self.level
            .parse::<Level>()
            .map_err(|_| SettingsError::LogLevel(self.level.clone()))
    }
}

impl AppConfig {
    /// Load from `path` (required) or `awakey.toml` (optional), then the environment
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::with_name(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };
        Self::from_builder(Config::builder().add_source(file))
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Reject engine settings outside their valid domains and unknown log levels
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.dms.validate().map_err(DmsError::from)?;
        self.logging.max_level()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(toml: &str) -> AppConfig {
        AppConfig::from_builder(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
            .unwrap()
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = from_toml("");
        assert_eq!(config.server.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.dms, DmsConfig::default());
        assert_eq!(config.alerting.cooldown_seconds, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_override() {
        let config = from_toml(
            r#"
            [server]
            bind_addr = "127.0.0.1:9000"

            [dms]
            drowsiness_threshold = 6
            confidence_threshold = 0.7

            [logging]
            json = true
            "#,
        );
        assert_eq!(config.server.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.dms.drowsiness_threshold, 6);
        assert_eq!(config.dms.confidence_threshold, 0.7);
        assert_eq!(config.dms.history_size, 30);
        assert!(config.logging.json);
    }

    #[test]
    fn test_invalid_engine_settings_rejected() {
        let config = from_toml(
            r#"
            [dms]
            confidence_threshold = 1.5
            "#,
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_log_level_rejected() {
        let config = from_toml(
            r#"
            [logging]
            level = "verbose"
            "#,
        );
        assert!(matches!(config.validate(), Err(SettingsError::LogLevel(level)) if level == "verbose"));

        let config = from_toml(
            r#"
            [logging]
            level = "DEBUG"
            "#,
        );
        assert_eq!(config.logging.max_level().unwrap(), Level::DEBUG);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_required_file_fails() {
        assert!(AppConfig::load(Some("/nonexistent/awakey-test-config")).is_err());
    }
}
