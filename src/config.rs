//! Configuration module
//!
//! Settings live in a TOML file, by default
//! `<config dir>/texnouz-ocpi/config.toml`; `OCPI_BRIDGE_CONFIG` points
//! elsewhere. Every section and field has a default, so a partial file is
//! valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::commands::DispatchTimeouts;
use crate::application::evse::{EvseResolver, DEFAULT_EVSE_ID_PATTERN};
use crate::domain::{OcpiParty, RoamingCredential};
use crate::shared::retry::RetryConfig;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV_VAR: &str = "OCPI_BRIDGE_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Default config file path: `<config dir>/texnouz-ocpi/config.toml`
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("texnouz-ocpi")
        .join("config.toml")
}

/// `OCPI_BRIDGE_CONFIG` if set, the default path otherwise.
pub fn config_path_from_env() -> PathBuf {
    std::env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_config_path())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub ocpi: OcpiConfig,
    pub commands: CommandsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// OCPI HTTP API
    pub api_host: String,
    pub api_port: u16,
    /// OCPP WebSocket endpoint
    pub ws_host: String,
    pub ws_port: u16,
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_host: "0.0.0.0".to_string(),
            api_port: 8080,
            ws_host: "0.0.0.0".to_string(),
            ws_port: 9000,
            shutdown_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcpiConfig {
    /// Our own party
    pub country_code: String,
    pub party_id: String,
    /// Public base URL advertised in version discovery
    pub base_url: String,
    /// Regex with capture groups for country, operator and charge station
    pub evse_id_pattern: String,
    /// Credentials accepted from roaming partners
    pub registrations: Vec<RoamingCredential>,
    /// Partners and the tokens we present to them
    pub parties: Vec<OcpiParty>,
}

impl Default for OcpiConfig {
    fn default() -> Self {
        Self {
            country_code: "UZ".to_string(),
            party_id: "TXN".to_string(),
            base_url: "http://localhost:8080".to_string(),
            evse_id_pattern: DEFAULT_EVSE_ID_PATTERN.to_string(),
            registrations: Vec::new(),
            parties: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandsConfig {
    /// Bound on runtime lookup and Emit while acknowledging a command
    pub acceptance_timeout_ms: u64,
    /// Time a station has to answer before the result is TIMEOUT
    pub result_timeout_secs: u64,
    /// How often overdue commands are swept
    pub sweep_interval_ms: u64,
    pub callback_connect_timeout_ms: u64,
    pub callback_timeout_secs: u64,
    /// Attempts per callback, first one included
    pub callback_attempts: u32,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            acceptance_timeout_ms: 5_000,
            result_timeout_secs: 30,
            sweep_interval_ms: 1_000,
            callback_connect_timeout_ms: 3_000,
            callback_timeout_secs: 10,
            callback_attempts: 3,
        }
    }
}

impl CommandsConfig {
    pub fn dispatch_timeouts(&self) -> DispatchTimeouts {
        DispatchTimeouts {
            acceptance: Duration::from_millis(self.acceptance_timeout_ms),
            result: Duration::from_secs(self.result_timeout_secs),
        }
    }

    pub fn callback_retry(&self) -> RetryConfig {
        RetryConfig::with_attempts(self.callback_attempts)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        std::fs::write(path, content).map_err(io_error)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        EvseResolver::new(&self.ocpi.evse_id_pattern)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.commands.acceptance_timeout_ms == 0 || self.commands.result_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "command timeouts must be greater than zero".to_string(),
            ));
        }
        if self.ocpi.country_code.len() != 2 || self.ocpi.party_id.len() != 3 {
            return Err(ConfigError::Invalid(
                "ocpi.country_code must have 2 characters and ocpi.party_id 3".to_string(),
            ));
        }
        Ok(())
    }

    pub fn api_address(&self) -> String {
        format!("{}:{}", self.server.api_host, self.server.api_port)
    }

    pub fn ws_address(&self) -> String {
        format!("{}:{}", self.server.ws_host, self.server.ws_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RegistrationStatus;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [server]
            ws_port = 9100

            [logging]
            format = "json"

            [[ocpi.registrations]]
            token = "emsp-token"
            status = "Registered"
            country_code = "NL"
            party_id = "EXA"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.ws_port, 9100);
        assert_eq!(config.server.api_port, 8080);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.commands.result_timeout_secs, 30);
        assert_eq!(config.ocpi.registrations[0].status, RegistrationStatus::Registered);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_pattern_without_station_group() {
        let mut config = AppConfig::default();
        config.ocpi.evse_id_pattern = r"^([A-Z]{2})\*(.*)$".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn save_then_load() {
        let path = std::env::temp_dir()
            .join(format!("texnouz-ocpi-{}", uuid::Uuid::new_v4()))
            .join("config.toml");
        let mut config = AppConfig::default();
        config.commands.callback_attempts = 5;
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.commands.callback_attempts, 5);
        assert_eq!(loaded.ocpi.evse_id_pattern, DEFAULT_EVSE_ID_PATTERN);
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = AppConfig::load(Path::new("/nonexistent/texnouz-ocpi.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn durations_follow_settings() {
        let commands = CommandsConfig {
            acceptance_timeout_ms: 250,
            ..CommandsConfig::default()
        };
        let timeouts = commands.dispatch_timeouts();
        assert_eq!(timeouts.acceptance, Duration::from_millis(250));
        assert_eq!(timeouts.result, Duration::from_secs(30));
        assert_eq!(commands.callback_retry().max_attempts, 3);
    }
}
