// src/config/env.rs
// Environment variable overrides for BridgeConfig

use super::BridgeConfig;
use crate::error::{BridgeError, Result};
use tracing::debug;

pub const ENV_BINDER_HOST: &str = "BINDILLA_BINDER_HOST";
pub const ENV_PROXY: &str = "BINDILLA_PROXY";
pub const ENV_HOST: &str = "BINDILLA_HOST";
pub const ENV_PORT: &str = "BINDILLA_PORT";
pub const ENV_RETENTION_SECS: &str = "BINDILLA_RETENTION_SECS";

impl BridgeConfig {
    /// Apply `BINDILLA_*` overrides from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary lookup (empty values are ignored)
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(host) = read(ENV_BINDER_HOST) {
            debug!(binder_host = %host, "Binder host overridden from environment");
            self.binder_host = host;
        }
        if let Some(value) = read(ENV_PROXY) {
            self.proxy = parse_bool(&value).ok_or_else(|| invalid(ENV_PROXY, &value))?;
        }
        if let Some(host) = read(ENV_HOST) {
            self.host = host;
        }
        if let Some(value) = read(ENV_PORT) {
            self.port = value.trim().parse().map_err(|_| invalid(ENV_PORT, &value))?;
        }
        if let Some(value) = read(ENV_RETENTION_SECS) {
            let secs = value
                .trim()
                .parse()
                .map_err(|_| invalid(ENV_RETENTION_SECS, &value))?;
            self.retention_secs = Some(secs);
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn invalid(name: &str, value: &str) -> BridgeError {
    BridgeError::Config(format!("invalid value for {}: '{}'", name, value))
}
