//! Configuration and settings management for ledgerbus
//!
//! Provides configuration file handling and validation. Supports JSON and
//! TOML file formats stored in the platform configuration directory.
//!
//! Configuration is organized into logical sections:
//! - Remote settings (server host, port, bus name)
//! - Bus settings (handshake timeout, worker naming)
//!
//! Credentials are never written to disk; they are supplied when connecting.

use ledgerbus_core::{ConfigError, Error, MessageBusConfig, Result, DEFAULT_BUS_NAME};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Remote message server settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteSettings {
    /// Connect on startup instead of running local only
    pub enabled: bool,
    /// Server hostname or IP address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Name of the bus to bind
    pub bus_name: String,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            host: "localhost".to_string(),
            port: 5300,
            bus_name: DEFAULT_BUS_NAME.to_string(),
        }
    }
}

/// Message bus tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusSettings {
    /// Maximum wait for the remote handshake in milliseconds
    pub handshake_timeout_ms: u64,
    /// Prefix for delivery worker thread names
    pub worker_name_prefix: String,
}

impl Default for BusSettings {
    fn default() -> Self {
        let defaults = MessageBusConfig::default();
        Self {
            handshake_timeout_ms: u64::try_from(defaults.handshake_timeout.as_millis())
                .unwrap_or(u64::MAX),
            worker_name_prefix: defaults.worker_name_prefix,
        }
    }
}

impl BusSettings {
    /// Convert into the configuration consumed by the bus
    pub fn to_bus_config(&self) -> MessageBusConfig {
        MessageBusConfig {
            handshake_timeout: Duration::from_millis(self.handshake_timeout_ms),
            worker_name_prefix: self.worker_name_prefix.clone(),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Remote server settings
    pub remote: RemoteSettings,
    /// Bus settings
    pub bus: BusSettings,
}

fn invalid(setting: &str, reason: &str) -> Error {
    ConfigError::InvalidValue {
        setting: setting.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

fn parse_error(path: &Path, reason: impl std::fmt::Display) -> Error {
    ConfigError::Parse {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
    .into()
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Default location: `<config dir>/ledgerbus/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("ledgerbus").join("config.toml"))
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        let config: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| parse_error(path, e))?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&content).map_err(|e| parse_error(path, e))?
        } else {
            return Err(parse_error(path, "config file must be .json or .toml"));
        };

        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        self.validate()?;

        let content = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::to_string_pretty(self)?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::to_string_pretty(self).map_err(|e| parse_error(path, e))?
        } else {
            return Err(parse_error(path, "config file must be .json or .toml"));
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.remote.enabled && self.remote.host.trim().is_empty() {
            return Err(invalid("remote.host", "must not be empty"));
        }
        if self.remote.port == 0 {
            return Err(invalid("remote.port", "must be > 0"));
        }
        if self.remote.bus_name.is_empty() {
            return Err(invalid("remote.bus_name", "must not be empty"));
        }
        if self.bus.handshake_timeout_ms == 0 {
            return Err(invalid("bus.handshake_timeout_ms", "must be > 0"));
        }
        Ok(())
    }
}
