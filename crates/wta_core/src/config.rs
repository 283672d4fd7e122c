//! Relay configuration.
//!
//! # Responsibility
//! - Load storage, destination, logging and transport settings from JSON.
//! - Apply `WTA_*` environment overrides on top of file values.
//!
//! # Invariants
//! - Every key is optional; missing keys take documented defaults.
//! - `validate()` must pass before values reach stores or senders.

use crate::logging::{default_log_level, normalize_level};
use crate::model::endpoint::DestinationId;
use crate::sender::transport::TransportOptions;
use crate::store::report_store::StorageParams;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_DATABASE_PATH: &str = "WTA_DATABASE_PATH";
pub const ENV_DESTINATION_ID: &str = "WTA_DESTINATION_ID";
pub const ENV_LOG_LEVEL: &str = "WTA_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "WTA_LOG_DIR";
pub const ENV_CONNECT_TIMEOUT_MS: &str = "WTA_CONNECT_TIMEOUT_MS";
pub const ENV_IO_TIMEOUT_MS: &str = "WTA_IO_TIMEOUT_MS";

const DEFAULT_DATABASE_PATH: &str = "wta_reports.sqlite3";
const DEFAULT_DESTINATION_ID: DestinationId = 1;

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    InvalidValue { key: &'static str, message: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config: {err}"),
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::InvalidValue { key, message } => write!(f, "invalid `{key}`: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::InvalidValue { .. } => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Transport timeouts in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub connect_timeout_ms: u64,
    pub io_timeout_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        let defaults = TransportOptions::default();
        Self {
            connect_timeout_ms: duration_ms(defaults.connect_timeout),
            io_timeout_ms: duration_ms(defaults.io_timeout),
        }
    }
}

/// Process-level relay settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Report database file.
    pub database_path: PathBuf,
    /// Destination site deliveries go to.
    pub destination_id: DestinationId,
    pub log_level: String,
    /// Absolute directory for rolling logs; logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    pub transport: TransportConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            destination_id: DEFAULT_DESTINATION_ID,
            log_level: default_log_level().to_string(),
            log_dir: None,
            transport: TransportConfig::default(),
        }
    }
}

impl RelayConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads a JSON config file, applies process environment overrides and
    /// validates the result.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let mut config = Self::from_json_str(&text)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Overrides values with `WTA_*` variables returned by `lookup`.
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = lookup(ENV_DATABASE_PATH) {
            self.database_path = PathBuf::from(value);
        }
        if let Some(value) = lookup(ENV_DESTINATION_ID) {
            self.destination_id = parse_number(ENV_DESTINATION_ID, &value)?;
        }
        if let Some(value) = lookup(ENV_LOG_LEVEL) {
            self.log_level = value;
        }
        if let Some(value) = lookup(ENV_LOG_DIR) {
            self.log_dir = Some(PathBuf::from(value));
        }
        if let Some(value) = lookup(ENV_CONNECT_TIMEOUT_MS) {
            self.transport.connect_timeout_ms = parse_number(ENV_CONNECT_TIMEOUT_MS, &value)?;
        }
        if let Some(value) = lookup(ENV_IO_TIMEOUT_MS) {
            self.transport.io_timeout_ms = parse_number(ENV_IO_TIMEOUT_MS, &value)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "database_path",
                message: "must not be empty".to_string(),
            });
        }
        normalize_level(&self.log_level).map_err(|err| ConfigError::InvalidValue {
            key: "log_level",
            message: err.to_string(),
        })?;
        if self.transport.connect_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "transport.connect_timeout_ms",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.transport.io_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "transport.io_timeout_ms",
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn storage_params(&self) -> StorageParams {
        StorageParams::new(self.database_path.clone(), self.destination_id)
    }

    pub fn transport_options(&self) -> TransportOptions {
        TransportOptions {
            connect_timeout: Duration::from_millis(self.transport.connect_timeout_ms),
            io_timeout: Duration::from_millis(self.transport.io_timeout_ms),
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|err| ConfigError::InvalidValue {
            key,
            message: format!("`{value}` is not a number: {err}"),
        })
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
