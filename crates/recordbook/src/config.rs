//! Configuration management for recordbook.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::fmt;
use std::path::{PathBuf, MAIN_SEPARATOR};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "recordbook";

/// Default workspace file name.
const WORKSPACE_FILE_NAME: &str = "workspace.json";

/// Prefix for environment overrides; `__` separates nested keys.
const ENV_PREFIX: &str = "RECORDBOOK_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `RECORDBOOK_`, e.g.
///    `RECORDBOOK_STORAGE__PRETTY_JSON=false`)
/// 2. TOML config file at `~/.config/recordbook/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Output configuration.
    pub output: OutputConfig,
}

/// Where and how the workspace snapshot is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the workspace JSON file.
    /// Defaults to `~/.local/share/recordbook/workspace.json`
    pub workspace_path: Option<PathBuf>,
    /// Indent the JSON written to the workspace file.
    pub pretty_json: bool,
}

/// How command results are printed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format.
    pub format: OutputFormat,
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Aligned plain-text columns.
    #[default]
    Table,
    /// Pretty-printed JSON.
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            workspace_path: None, // Resolved at runtime
            pretty_json: true,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `RECORDBOOK_`)
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
            .merge(Toml::file(&config_file))
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
        if let Some(path) = &self.storage.workspace_path {
            let raw = path.to_string_lossy();
            if raw.trim().is_empty() {
                return Err(Error::ConfigValidation {
                    message: "workspace_path cannot be empty".to_string(),
                });
            }
            if raw.ends_with(MAIN_SEPARATOR) || raw.ends_with('/') {
                return Err(Error::ConfigValidation {
                    message: format!("workspace_path must name a file, not a directory: {raw}"),
                });
            }
        }

        Ok(())
    }

    /// Get the workspace path, resolving defaults if not set.
    #[must_use]
    pub fn workspace_path(&self) -> PathBuf {
        self.storage
            .workspace_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(WORKSPACE_FILE_NAME))
    }
}
