//! Configuration loading traits and types.
//!
//! The whole apparatus is described by one TOML file:
//!
//! ```toml
//! [general]
//! experiment_name = "Cluster"
//! revision = "rev2"
//!
//! [operators]
//! alice = "alice@example.org"
//!
//! [email]
//! enabled = false
//!
//! [relay.A]
//! pin = 7
//! name = "Main chamber"
//! warning = true
//! shutdown = true
//! active = true
//!
//! # relay.B … relay.F follow the same layout; `active = false` is enough
//! # for an unused slot.
//!
//! [shutdown]
//! turbo_pump = 11
//!
//! [error_led]
//! pin = 15
//!
//! [reset_button]
//! pin = 16
//! ```
//!
//! Entity sections (relays, switches, indicator, reset button) use optional
//! fields so a missing value is reported by the registry loader together with
//! every other problem instead of aborting the parse.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::consts::{
    DEFAULT_DEBOUNCE_MS, DEFAULT_HEARTBEAT_SECS, DEFAULT_SMTP_PORT, MAX_HEARTBEAT_SECS,
};

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

// ─── Sections ───────────────────────────────────────────────────────

/// `[general]`: experiment identity and process settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Experiment name used in every alert text.
    pub experiment_name: String,

    /// Hardware revision tag (`"rev1"`, `"rev2"`). Resolved by the registry.
    #[serde(default)]
    pub revision: Option<String>,

    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Optional log file; events are written there in addition to stderr.
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Heartbeat interval of the supervisor loop [s].
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,

    /// Reset-button debounce window [ms].
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_heartbeat_secs() -> u64 {
    DEFAULT_HEARTBEAT_SECS
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

/// `[email]`: notification transport settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Administrative switch. `false` routes every alert to the log only.
    #[serde(default)]
    pub enabled: bool,

    /// SMTP login.
    #[serde(default)]
    pub username: Option<String>,

    /// SMTP password.
    #[serde(default)]
    pub password: Option<String>,

    /// SMTP relay host.
    #[serde(default)]
    pub server: Option<String>,

    /// SMTP submission port. Default: 587.
    #[serde(default)]
    pub port: Option<u16>,

    /// Envelope sender address. Default: `username`.
    #[serde(default)]
    pub sender: Option<String>,
}

impl EmailConfig {
    /// Effective submission port.
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_SMTP_PORT)
    }

    /// Effective sender address.
    pub fn sender(&self) -> Option<&str> {
        self.sender.as_deref().or(self.username.as_deref())
    }
}

/// `[relay.X]`: one monitored pressure-gauge relay.
///
/// Fields are kept as raw TOML values so a wrong-typed entry is reported
/// alongside every other problem instead of rejecting the whole file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelaySection {
    /// Physical header pin (integer).
    #[serde(default)]
    pub pin: Option<toml::Value>,
    /// Display name used in alert texts (string).
    #[serde(default)]
    pub name: Option<toml::Value>,
    /// Send a warning when the relay trips (boolean).
    #[serde(default)]
    pub warning: Option<toml::Value>,
    /// Cut power when the relay trips (boolean).
    #[serde(default)]
    pub shutdown: Option<toml::Value>,
    /// Wire the relay into the I/O subsystem (boolean).
    #[serde(default)]
    pub active: Option<toml::Value>,
}

/// A section holding a single `pin` entry (`[error_led]`, `[reset_button]`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PinSection {
    /// Physical header pin (integer).
    #[serde(default)]
    pub pin: Option<toml::Value>,
}

// ─── VssConfig ──────────────────────────────────────────────────────

/// Top-level configuration of one apparatus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VssConfig {
    /// Experiment identity and process settings.
    pub general: GeneralConfig,

    /// Operator id → address.
    #[serde(default)]
    pub operators: BTreeMap<String, String>,

    /// Notification transport.
    #[serde(default)]
    pub email: EmailConfig,

    /// Relay slot key (`"A"`…`"F"`) → relay section.
    #[serde(default)]
    pub relay: BTreeMap<String, RelaySection>,

    /// Shutdown switch name → physical pin (integer).
    #[serde(default)]
    pub shutdown: Option<BTreeMap<String, toml::Value>>,

    /// Error indicator output.
    #[serde(default)]
    pub error_led: Option<PinSection>,

    /// Operator reset button input.
    #[serde(default)]
    pub reset_button: Option<PinSection>,
}

impl VssConfig {
    /// Parse from TOML string and validate.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file and validate.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let config = <Self as ConfigLoader>::load(path)?;
        config.validate()?;
        Ok(config)
    }

    /// File-level validation. Entity problems are left to the registry loader.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if:
    /// - `experiment_name` is empty
    /// - `heartbeat_secs` is zero or above `MAX_HEARTBEAT_SECS`
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.general.experiment_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "experiment_name cannot be empty".to_string(),
            ));
        }
        if !(1..=MAX_HEARTBEAT_SECS).contains(&self.general.heartbeat_secs) {
            return Err(ConfigError::ValidationError(format!(
                "heartbeat_secs must be between 1 and {MAX_HEARTBEAT_SECS}"
            )));
        }
        Ok(())
    }

    /// Configured recipient addresses in operator-id order.
    pub fn recipients(&self) -> Vec<String> {
        self.operators.values().cloned().collect()
    }
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
