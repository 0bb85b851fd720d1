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

impl Config {
    /// Returns the path to the configuration file.
    ///
    /// Uses `~/.config/homedeck/config.toml` on Unix/macOS,
    /// or equivalent on other platforms via `dirs::config_dir()`.
    /// Falls back to current directory if config_dir is unavailable.
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("homedeck").join("config.toml")
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
    /// Checks:
    /// - The library base URL is http(s)
    /// - At least one cover path is configured, each with an `{id}` placeholder
    /// - Request and connect timeouts are non-zero
    /// - The failure threshold and capacity are non-zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_url = &self.library.base_url;
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::ValidationError {
                message: format!("Library base_url '{}' must start with http:// or https://", base_url),
            });
        }

        if self.library.cover_paths.is_empty() {
            return Err(ConfigError::ValidationError {
                message: "At least one cover path must be configured".to_string(),
            });
        }

        for template in &self.library.cover_paths {
            if !template.starts_with('/') || !template.contains("{id}") {
                return Err(ConfigError::ValidationError {
                    message: format!(
                        "Cover path '{}' must start with '/' and contain an {{id}} placeholder",
                        template
                    ),
                });
            }
        }

        if self.library.timeout_seconds == 0 || self.library.connect_timeout_seconds == 0 {
            return Err(ConfigError::ValidationError {
                message: "library timeouts must be at least 1 second".to_string(),
            });
        }

        if self.cache.failure_threshold == 0 {
            return Err(ConfigError::ValidationError {
                message: "cache.failure_threshold must be at least 1".to_string(),
            });
        }

        if self.cache.capacity == Some(0) {
            return Err(ConfigError::ValidationError {
                message: "cache.capacity must be at least 1 when set".to_string(),
            });
        }

        Ok(())
    }
}
