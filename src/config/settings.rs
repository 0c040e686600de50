//! Configuration settings for savoir-sync.
//!
//! Settings are loaded from `~/.savoir/config.yaml`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cli::args::OutputFormat;
use crate::config::Paths;
use crate::error::SyncError;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// General settings.
    pub general: GeneralConfig,
    /// Submission endpoint settings.
    pub endpoint: EndpointConfig,
    /// Offline queue settings.
    pub queue: QueueConfig,
    /// Connectivity probe settings.
    pub connectivity: ConnectivityConfig,
    /// Diagnostic logging settings.
    pub logging: LoggingConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Default output format.
    #[serde(default = "default_output_format")]
    pub default_output: OutputFormat,
    /// Color output setting.
    #[serde(default = "default_color")]
    pub color: ColorSetting,
}

/// Color output setting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColorSetting {
    /// Auto-detect based on terminal.
    #[default]
    Auto,
    /// Always use colors.
    Always,
    /// Never use colors.
    Never,
}

impl ColorSetting {
    /// Apply this setting to the global `colored` override.
    pub fn apply(self) {
        match self {
            Self::Auto => colored::control::unset_override(),
            Self::Always => colored::control::set_override(true),
            Self::Never => colored::control::set_override(false),
        }
    }
}

/// How a payload is encoded in the POST body.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BodyEncoding {
    /// `application/x-www-form-urlencoded`, as read by the quiz endpoint.
    #[default]
    Form,
    /// `application/json`.
    Json,
}

/// What happens to actions whose replay failed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReplayPolicy {
    /// Failed actions are dropped when the pass ends.
    #[default]
    AtMostOnce,
    /// Failed actions are written back for the next reconnect.
    RequeueFailed,
}

/// Submission endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Base URL that relative action targets are resolved against.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// CSRF token sent as `X-CSRFToken`.
    #[serde(default)]
    pub csrf_token: Option<String>,
    /// Body encoding for POSTs.
    #[serde(default)]
    pub body_encoding: BodyEncoding,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Offline queue settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Name of the persistent slot holding the queue.
    #[serde(default = "default_slot")]
    pub slot: String,
    /// Replay policy for failed deliveries.
    #[serde(default)]
    pub replay_policy: ReplayPolicy,
    /// Maximum size of a stored value in bytes.
    #[serde(default)]
    pub max_bytes: Option<usize>,
}

/// Connectivity probe settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectivityConfig {
    /// Seconds between reachability probes while watching.
    #[serde(default = "default_probe_interval")]
    pub probe_interval_secs: u64,
    /// Connect timeout of a single probe in seconds.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
}

/// Diagnostic logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing-subscriber` filter directive, overridden by `RUST_LOG`.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

// Default value functions for serde
/// Floor for every configured interval and timeout.
const MIN_SECS: u64 = 1;

const fn default_output_format() -> OutputFormat {
    OutputFormat::Pretty
}

const fn default_color() -> ColorSetting {
    ColorSetting::Auto
}

fn default_base_url() -> String {
    "http://localhost:8000/".to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

fn default_slot() -> String {
    "offlineQueue".to_string()
}

const fn default_probe_interval() -> u64 {
    5
}

const fn default_probe_timeout() -> u64 {
    2
}

fn default_log_filter() -> String {
    "savoir_sync=warn".to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_output: default_output_format(),
            color: default_color(),
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            csrf_token: None,
            body_encoding: BodyEncoding::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl EndpointConfig {
    /// Per-request timeout, at least one second.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(MIN_SECS))
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            slot: default_slot(),
            replay_policy: ReplayPolicy::default(),
            max_bytes: None,
        }
    }
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            probe_interval_secs: default_probe_interval(),
            probe_timeout_secs: default_probe_timeout(),
        }
    }
}

impl ConnectivityConfig {
    /// Interval between probes, at least one second.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs.max(MIN_SECS))
    }

    /// Timeout of a single probe, at least one second.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs.max(MIN_SECS))
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self, SyncError> {
        let paths = Paths::new()?;
        Self::load_from_path(&paths.config_file)
    }

    /// Load configuration from a specific path.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load_from_path(path: &std::path::Path) -> Result<Self, SyncError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            SyncError::Config(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;

        serde_yaml::from_str(&contents).map_err(|e| {
            SyncError::Config(format!(
                "Failed to parse config file {}: {e}",
                path.display()
            ))
        })
    }

    /// Save configuration to a specific path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be written.
    pub fn save_to_path(&self, path: &std::path::Path) -> Result<(), SyncError> {
        let contents = serde_yaml::to_string(self)
            .map_err(|e| SyncError::Config(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, contents).map_err(|e| {
            SyncError::Config(format!(
                "Failed to write config file {}: {e}",
                path.display()
            ))
        })
    }
}
