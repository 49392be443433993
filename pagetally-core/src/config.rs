//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/pagetally/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/pagetally/` (~/.config/pagetally/)
//! - Data: `$XDG_DATA_HOME/pagetally/` (~/.local/share/pagetally/)
//! - State/Logs: `$XDG_STATE_HOME/pagetally/` (~/.local/state/pagetally/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Snapshot storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to bind on
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

/// Snapshot storage configuration
#[derive(Debug, Deserialize, Default)]
pub struct StorageConfig {
    /// Override path for the snapshot file.
    /// Defaults to `$XDG_DATA_HOME/pagetally/analytics.json`.
    pub data_file: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/pagetally/config.toml` (~/.config/pagetally/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("pagetally").join("config.toml")
    }

    /// Returns the data directory path (for the snapshot file)
    ///
    /// `$XDG_DATA_HOME/pagetally/` (~/.local/share/pagetally/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("pagetally")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/pagetally/` (~/.local/state/pagetally/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("pagetally")
    }

    /// Returns the snapshot file path, honoring the storage override
    ///
    /// `$XDG_DATA_HOME/pagetally/analytics.json` unless overridden
    pub fn snapshot_path(&self) -> PathBuf {
        self.storage
            .data_file
            .clone()
            .unwrap_or_else(|| Self::data_dir().join("analytics.json"))
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/pagetally/pagetally.log` (~/.local/state/pagetally/pagetally.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("pagetally.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert!(config.storage.data_file.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[server]
port = 8080

[storage]
data_file = "/tmp/analytics.json"

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(
            config.storage.data_file.as_deref(),
            Some(std::path::Path::new("/tmp/analytics.json"))
        );
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_snapshot_path_override() {
        let config: Config = toml::from_str(
            r#"
[storage]
data_file = "/var/lib/pagetally/data.json"
"#,
        )
        .unwrap();
        assert_eq!(
            config.snapshot_path(),
            PathBuf::from("/var/lib/pagetally/data.json")
        );

        let config = Config::default();
        assert!(config.snapshot_path().ends_with("pagetally/analytics.json"));
    }
}
