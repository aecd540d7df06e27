//! Configuration management for icm
//!
//! Settings come from an optional `~/.icm/config.toml`, then the `CTOP_DEBUG*`
//! environment variables override them.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::logging::{LoggerConfig, DEFAULT_CAPACITY, DEFAULT_DEBUG_PORT};

/// Enables debug mode when set to `1`
pub const DEBUG_ENV: &str = "CTOP_DEBUG";

/// Debug server listens on all interfaces when set to `1`
pub const DEBUG_TCP_ENV: &str = "CTOP_DEBUG_TCP";

/// Path of the log file to mirror records to
pub const DEBUG_FILE_ENV: &str = "CTOP_DEBUG_FILE";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Logger settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// `[logging]` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Records kept in memory (default: 1024)
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Debug server port (default: 9000)
    #[serde(default = "default_debug_port")]
    pub debug_port: u16,

    /// Mirror records to stderr when no log file is set
    #[serde(default)]
    pub console: bool,
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_debug_port() -> u16 {
    DEFAULT_DEBUG_PORT
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            debug_port: default_debug_port(),
            console: false,
        }
    }
}

impl Config {
    /// Load configuration from file, or return default if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from `path`, or return default if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    /// Combine file settings with environment overrides
    pub fn logger_config(&self, env: &EnvOverrides) -> LoggerConfig {
        LoggerConfig {
            capacity: self.logging.capacity,
            debug: env.debug,
            debug_tcp: env.debug_tcp,
            debug_port: self.logging.debug_port,
            file: env.debug_file.clone(),
            console: self.logging.console,
        }
    }
}

/// Logger settings taken from the environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    pub debug: bool,
    pub debug_tcp: bool,
    pub debug_file: Option<PathBuf>,
}

impl EnvOverrides {
    /// Read the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its value
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let flag = |key: &str| lookup(key).as_deref() == Some("1");

        let debug_file = lookup(DEBUG_FILE_ENV)
            .filter(|path| !path.is_empty())
            .map(|path| expand_path(&path));

        Self {
            debug: flag(DEBUG_ENV),
            debug_tcp: flag(DEBUG_TCP_ENV),
            debug_file,
        }
    }
}

/// Expand `~` and `$VAR` in a path, keeping it as given if expansion fails
fn expand_path(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(path),
    }
}

/// Get the base configuration directory (~/.icm)
/// Falls back to ./.icm if home directory cannot be determined
pub fn config_dir() -> PathBuf {
    try_config_dir().unwrap_or_else(|| PathBuf::from(".icm"))
}

/// Try to get the base configuration directory, returning None if home dir is unavailable
pub fn try_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".icm"))
}

/// Get the path to the config file
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}
