//! Configuration management for docperm.
//!
//! This module provides configuration loading with multiple sources:
//! 1. Default values (hardcoded)
//! 2. Configuration file (YAML)
//! 3. Environment variables (override)
//!
//! Environment variables take precedence over config file values,
//! which take precedence over defaults.
//!
//! # Example
//!
//! ```ignore
//! use docperm_server::config::AppConfig;
//!
//! // Load from file with env overrides
//! let config = AppConfig::load("docperm.yaml")?;
//!
//! // Or load from environment only
//! let config = AppConfig::from_env()?;
//! ```

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prefix of environment overrides: `DOCPERM_ACCESS__MAX_WRITE_ATTEMPTS=5`.
const ENV_PREFIX: &str = "DOCPERM";

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct AppConfig {
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Access resolution settings
    #[serde(default)]
    pub access: AccessSettings,

    /// Storage settings
    #[serde(default)]
    pub storage: StorageSettings,
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingSettings {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Use JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Access resolution and grant-write settings.
///
/// ```yaml
/// access:
///   max_write_attempts: 3
///   max_ancestor_depth: 64
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AccessSettings {
    /// How many times a grant write is re-checked after a version conflict
    /// before the request fails.
    ///
    /// Environment variable: `DOCPERM_ACCESS__MAX_WRITE_ATTEMPTS`
    #[serde(default = "default_max_write_attempts")]
    pub max_write_attempts: u32,

    /// Deepest allowed document nesting. Bounds both the store and the
    /// resolver.
    ///
    /// Environment variable: `DOCPERM_ACCESS__MAX_ANCESTOR_DEPTH`
    #[serde(default = "default_max_ancestor_depth")]
    pub max_ancestor_depth: u32,
}

impl Default for AccessSettings {
    fn default() -> Self {
        Self {
            max_write_attempts: default_max_write_attempts(),
            max_ancestor_depth: default_max_ancestor_depth(),
        }
    }
}

fn default_max_write_attempts() -> u32 {
    3
}

fn default_max_ancestor_depth() -> u32 {
    64
}

/// Storage backend settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct StorageSettings {
    /// Storage backend type. Only "memory" is available.
    #[serde(default = "default_storage_backend")]
    pub backend: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
        }
    }
}

fn default_storage_backend() -> String {
    "memory".to_string()
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    /// Failed to load or parse configuration.
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    FileNotFound { path: String },

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

impl AppConfig {
    /// Loads configuration from a YAML file, then applies `DOCPERM_*`
    /// environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigLoadError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let config = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(File::from(path).format(FileFormat::Yaml))
            // DOCPERM_ACCESS__MAX_WRITE_ATTEMPTS -> access.max_write_attempts
            .add_source(env_source())
            .build()?;

        let app_config: AppConfig = config.try_deserialize()?;
        app_config.validate()?;

        Ok(app_config)
    }

    /// Loads configuration from defaults and environment variables only.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        let config = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(env_source())
            .build()?;

        let app_config: AppConfig = config.try_deserialize()?;
        app_config.validate()?;

        Ok(app_config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        let valid_backends = ["memory"];
        if !valid_backends.contains(&self.storage.backend.as_str()) {
            return Err(ConfigLoadError::Invalid {
                message: format!(
                    "storage.backend must be one of: {:?}, got: {}",
                    valid_backends, self.storage.backend
                ),
            });
        }

        if self.access.max_write_attempts == 0 {
            return Err(ConfigLoadError::Invalid {
                message: "access.max_write_attempts must be greater than 0".to_string(),
            });
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigLoadError::Invalid {
                message: format!(
                    "logging.level must be one of: {:?}, got: {}",
                    valid_levels, self.logging.level
                ),
            });
        }

        Ok(())
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
