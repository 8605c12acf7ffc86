//! Configuration management for graypipe.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. Every section implements `Default`, so a partial TOML file only
//! needs the keys it wants to change.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for graypipe.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default input location and file list
    pub input: InputConfig,

    /// Stage hand-off settings
    pub pipeline: PipelineConfig,

    /// Resize stage settings
    pub resize: ResizeConfig,

    /// Save stage settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.graypipe.graypipe/config.toml
    /// - Linux: ~/.config/graypipe/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\graypipe\config\config.toml
    ///
    /// Falls back to ~/.graypipe/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "graypipe", "graypipe")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".graypipe").join("config.toml")
            })
    }

    /// Get the resolved input directory (with ~ expansion).
    pub fn input_dir(&self) -> PathBuf {
        let path_str = self.input.dir.to_string_lossy();
        let expanded = shellexpand::tilde(&path_str);
        PathBuf::from(expanded.into_owned())
    }

    /// The fixed input list: each configured file name under the input dir.
    ///
    /// Joined as strings with a `/` separator so the destination segment
    /// replacement sees the same text on every platform.
    pub fn default_sources(&self) -> Vec<PathBuf> {
        let dir = self.input_dir();
        let dir = dir.to_string_lossy();
        let dir = dir.trim_end_matches('/');
        self.input
            .files
            .iter()
            .map(|name| PathBuf::from(format!("{dir}/{name}")))
            .collect()
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}
