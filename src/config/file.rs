// src/config/file.rs
// File-based configuration from ~/.bindilla/config.toml

use super::{DEFAULT_BINDER_HOST, DEFAULT_ENVIRONS};
use crate::environ::{self, EnvironSpec};
use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Top-level config structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Base URL of the Binder deployment that builds and runs containers
    pub binder_host: String,
    /// Proxy calls through this server (true) or hand out direct container URLs
    pub proxy: bool,
    pub host: String,
    pub port: u16,
    /// Environ identifiers listed in the manifest by default
    pub environs: Vec<String>,
    /// Drop finished launches this many seconds after they complete
    pub retention_secs: Option<u64>,
    pub connect_timeout_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            binder_host: DEFAULT_BINDER_HOST.to_string(),
            proxy: true,
            host: "127.0.0.1".to_string(),
            port: 8888,
            environs: DEFAULT_ENVIRONS.iter().map(|s| s.to_string()).collect(),
            retention_secs: None,
            connect_timeout_secs: 30,
        }
    }
}

impl BridgeConfig {
    /// Load config from ~/.bindilla/config.toml, falling back to defaults
    pub fn load() -> Self {
        let path = Self::config_path();

        match std::fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    debug!(path = %path.display(), "Loaded config from file");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to parse config file");
                    Self::default()
                }
            },
            Err(_) => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                Self::default()
            }
        }
    }

    /// Load config from an explicit path; unlike [`BridgeConfig::load`] a
    /// missing or malformed file is an error
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = toml::from_str(&contents).map_err(|e| {
            BridgeError::Config(format!("failed to parse {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "Loaded config from file");
        Ok(config)
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".bindilla")
            .join("config.toml")
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn retention(&self) -> Option<Duration> {
        self.retention_secs.map(Duration::from_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Parse the configured default environs; a bad entry is a config error
    pub fn default_environs(&self) -> Result<Vec<EnvironSpec>> {
        self.environs
            .iter()
            .map(|id| {
                environ::parse(id)
                    .map_err(|e| BridgeError::Config(format!("default environ {}: {}", id, e)))
            })
            .collect()
    }

    /// Check values that would otherwise only fail at first use
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.binder_host).map_err(|e| {
            BridgeError::Config(format!("binder_host '{}' is not a URL: {}", self.binder_host, e))
        })?;
        self.default_environs()?;
        Ok(())
    }
}
