use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::types::Config;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

const MAX_ATTEMPTS: u32 = 10;
const MAX_INITIAL_DELAY_MS: u64 = 60_000;
const MAX_MULTIPLIER: f64 = 10.0;

impl Config {
    /// Returns the path to the configuration file.
    ///
    /// Uses `~/.config/skillbridge/config.toml` on Unix/macOS,
    /// or equivalent on other platforms via `dirs::config_dir()`.
    /// Falls back to current directory if config_dir is unavailable.
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("skillbridge").join("config.toml")
    }

    /// Loads configuration from the default config file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Loads configuration from `path`.
    ///
    /// - If the file doesn't exist, returns `Config::default()`.
    /// - If the file exists, parses it as TOML and validates.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// Retry settings are capped so backoff growth stays finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: &str| {
            Err(ConfigError::ValidationError {
                message: message.to_string(),
            })
        };

        if self.api.base_url.trim().is_empty() {
            return invalid("api.base_url must not be empty");
        }
        if self.api.request_timeout_ms == 0 {
            return invalid("api.request_timeout_ms must be greater than zero");
        }
        if !(1..=MAX_ATTEMPTS).contains(&self.retry.max_attempts) {
            return invalid("retry.max_attempts must be between 1 and 10");
        }
        if self.retry.initial_delay_ms > MAX_INITIAL_DELAY_MS {
            return invalid("retry.initial_delay_ms must be at most 60000");
        }
        if !(1.0..=MAX_MULTIPLIER).contains(&self.retry.multiplier) {
            return invalid("retry.multiplier must be between 1.0 and 10.0");
        }

        Ok(())
    }
}
