//! Configuration management for savoir-sync.
//!
//! This module handles loading and saving configuration from `~/.savoir/`.

mod paths;
mod settings;

pub use paths::Paths;
pub use settings::{
    BodyEncoding, ColorSetting, Config, ConnectivityConfig, EndpointConfig, GeneralConfig,
    LoggingConfig, QueueConfig, ReplayPolicy,
};
