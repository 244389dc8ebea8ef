// src/bridge.rs
// The bridge: manifest, launch, inspect and proxy wired to one registry

use crate::config::BridgeConfig;
use crate::environ::{self, EnvironSpec};
use crate::error::{BridgeError, Result};
use crate::launch::{LaunchHandle, LaunchRecord, LaunchRegistry, Launcher};
use crate::manifest::Manifest;
use crate::proxy::{Forwarder, ProxyOutcome};
use axum::body::Bytes;
use reqwest::{Client, Method};
use std::sync::Arc;

#[derive(Clone)]
pub struct Bridge {
    environs: Arc<Vec<EnvironSpec>>,
    registry: LaunchRegistry,
    launcher: Launcher,
    forwarder: Forwarder,
}

impl Bridge {
    pub fn new(config: &BridgeConfig) -> Result<Self> {
        let client = http_client(config)?;
        let registry = match config.retention() {
            Some(retention) => LaunchRegistry::with_retention(retention),
            None => LaunchRegistry::new(),
        };
        Self::with_parts(config, client, registry)
    }

    /// Build from an existing client and registry
    pub fn with_parts(
        config: &BridgeConfig,
        client: Client,
        registry: LaunchRegistry,
    ) -> Result<Self> {
        let environs = config.default_environs()?;
        let launcher = Launcher::new(
            client.clone(),
            registry.clone(),
            config.binder_host.clone(),
            config.proxy,
        );
        let forwarder = Forwarder::new(client, registry.clone());
        Ok(Self {
            environs: Arc::new(environs),
            registry,
            launcher,
            forwarder,
        })
    }

    pub fn registry(&self) -> &LaunchRegistry {
        &self.registry
    }

    pub fn manifest<S: AsRef<str>>(&self, extra: &[S]) -> Result<Manifest> {
        Manifest::build(&self.environs, extra)
    }

    /// Launch and wait for the launch stream to end
    pub async fn launch_environ(&self, identifier: &str) -> Result<LaunchRecord> {
        let environ = environ::parse(identifier)?;
        self.launcher.launch(environ).await
    }

    /// Launch in the background, returning as soon as the launch is registered
    pub async fn start_environ(&self, identifier: &str) -> Result<LaunchHandle> {
        let environ = environ::parse(identifier)?;
        Ok(self.launcher.start(environ).await)
    }

    pub async fn inspect_environ(&self, launch_id: &str) -> Result<LaunchRecord> {
        self.registry
            .get(launch_id)
            .await
            .ok_or_else(|| BridgeError::UnknownLaunch(launch_id.to_string()))
    }

    pub async fn proxy(
        &self,
        method: Method,
        launch_id: &str,
        path: &str,
        body: Option<Bytes>,
    ) -> Result<ProxyOutcome> {
        self.forwarder.forward(method, launch_id, path, body).await
    }
}

/// HTTP client shared by launches and proxied calls.
///
/// Only the connect phase is bounded; launch streams stay open for as long as
/// the build takes.
pub fn http_client(config: &BridgeConfig) -> Result<Client> {
    Client::builder()
        .connect_timeout(config.connect_timeout())
        .user_agent(concat!("bindilla/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| BridgeError::Config(format!("failed to build HTTP client: {}", e)))
}
