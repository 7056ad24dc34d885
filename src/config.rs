//! Configuration management for the graph console.
//!
//! Loads session tunables and storage locations from a TOML file. Every
//! section and field is optional; a missing file yields the defaults.

use crate::error::{ConsoleError, Result};
use crate::session::{SessionConfig, DEFAULT_FAVORITES_KEY, DEFAULT_SETTLE_DELAY, DEFAULT_STATEMENT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory name used under the platform config and state directories.
pub const APP_DIR: &str = "graph-console";

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Session behavior.
    #[serde(default)]
    pub session: SessionSettings,

    /// Durable storage.
    #[serde(default)]
    pub storage: StorageSettings,
}

/// `[session]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSettings {
    /// Milliseconds to keep `loading` set after a run completes.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Statement shown for a fresh or reset session.
    #[serde(default = "default_statement")]
    pub default_statement: String,
}

fn default_settle_delay_ms() -> u64 {
    DEFAULT_SETTLE_DELAY.as_millis() as u64
}

fn default_statement() -> String {
    DEFAULT_STATEMENT.to_string()
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            default_statement: default_statement(),
        }
    }
}

/// `[storage]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageSettings {
    /// State database path. Defaults to the platform location when unset.
    pub state_db: Option<PathBuf>,

    /// Key under which favorites are stored.
    #[serde(default = "default_favorites_key")]
    pub favorites_key: String,
}

fn default_favorites_key() -> String {
    DEFAULT_FAVORITES_KEY.to_string()
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            state_db: None,
            favorites_key: default_favorites_key(),
        }
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.toml")
    }

    /// Loads configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConsoleError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            ConsoleError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Builds the coordinator settings from this configuration.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            settle_delay: Duration::from_millis(self.session.settle_delay_ms),
            default_statement: self.session.default_statement.clone(),
            favorites_key: self.storage.favorites_key.clone(),
        }
    }
}
