//! SDK configuration.
//!
//! Configuration can be built in code or loaded from a TOML file:
//!
//! ```toml
//! url = "https://api.example.com/v1"
//! application = "my-app-id"
//! key = "my-api-key"
//! device_name = "kiosk-3"
//! ```

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The config file could not be parsed.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Connection settings for the Perimeter service.
#[derive(Debug, Clone, Deserialize)]
pub struct SdkConfig {
    /// Service endpoint URL.
    pub url: String,
    /// Application identifier issued by the service.
    pub application: String,
    /// API key issued by the service.
    pub key: String,
    /// Human-readable device name sent on registration.
    #[serde(default = "default_device_name")]
    pub device_name: String,
}

fn default_device_name() -> String {
    "perimeter device".to_string()
}

impl SdkConfig {
    /// Build a configuration in code.
    pub fn new(
        url: impl Into<String>,
        application: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            application: application.into(),
            key: key.into(),
            device_name: default_device_name(),
        }
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Set the device name.
    pub fn with_device_name(mut self, name: impl Into<String>) -> Self {
        self.device_name = name.into();
        self
    }
}
