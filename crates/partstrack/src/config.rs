//! Configuration management for partstrack.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::refresh::{RefreshPolicy, DEFAULT_STALENESS_HOURS};
use crate::timeline::DEFAULT_VISIBLE_CHECKPOINTS;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "partstrack";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "parts.db";

/// Prefix for environment variable overrides.
const ENV_PREFIX: &str = "PARTSTRACK_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `PARTSTRACK_`, sections split on `__`)
/// 2. TOML config file at `~/.config/partstrack/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Tracking API configuration.
    pub tracking: TrackingConfig,
    /// Timeline display configuration.
    pub timeline: TimelineConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/partstrack/parts.db`
    pub database_path: Option<PathBuf>,
}

/// Tracking API configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Base URL of the tracking API (`/tracking/{id}` is appended).
    pub api_base_url: String,
    /// Bearer credential for the tracking API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    /// Hours before cached tracking data is eligible for automatic refresh.
    pub staleness_hours: u32,
    /// Refresh automatically when a part is viewed.
    pub auto_refresh: bool,
}

/// Timeline display configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Checkpoints shown before "show more".
    pub visible_checkpoints: usize,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000/api".to_string(),
            auth_token: None,
            staleness_hours: DEFAULT_STALENESS_HOURS,
            auto_refresh: true,
        }
    }
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            visible_checkpoints: DEFAULT_VISIBLE_CHECKPOINTS,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file).nested())
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.tracking.staleness_hours == 0 {
            return Err(Error::ConfigValidation {
                message: "staleness_hours must be greater than 0".to_string(),
            });
        }

        if self.timeline.visible_checkpoints == 0 {
            return Err(Error::ConfigValidation {
                message: "visible_checkpoints must be greater than 0".to_string(),
            });
        }

        match reqwest::Url::parse(&self.tracking.api_base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => {
                return Err(Error::ConfigValidation {
                    message: format!(
                        "api_base_url must be an absolute http(s) URL: {}",
                        self.tracking.api_base_url
                    ),
                });
            }
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Build the refresh policy described by this configuration.
    #[must_use]
    pub fn refresh_policy(&self) -> RefreshPolicy {
        RefreshPolicy::new(self.tracking.staleness_hours).with_enabled(self.tracking.auto_refresh)
    }
}
