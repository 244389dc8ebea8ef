// src/launch/orchestrator.rs
// Drives a build request against the launch service and folds its event stream

use super::{LaunchRecord, LaunchRegistry};
use crate::environ::EnvironSpec;
use crate::error::{BridgeError, Result};
use crate::sse::decode_stream;
use chrono::Utc;
use futures::StreamExt;
use reqwest::{Client, header};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Launches environs on a Binder deployment
#[derive(Clone)]
pub struct Launcher {
    client: Client,
    registry: LaunchRegistry,
    binder_host: String,
    proxy: bool,
}

/// A launch running in the background
pub struct LaunchHandle {
    pub id: String,
    task: JoinHandle<Result<LaunchRecord>>,
}

impl LaunchHandle {
    /// Wait for the launch stream to end
    pub async fn wait(self) -> Result<LaunchRecord> {
        self.task.await.map_err(|e| {
            BridgeError::LaunchService(format!("launch task {} did not finish: {}", self.id, e))
        })?
    }
}

impl Launcher {
    /// `client` must not carry a total request timeout: builds can take
    /// arbitrarily long and the stream stays open until the container is up.
    pub fn new(
        client: Client,
        registry: LaunchRegistry,
        binder_host: impl Into<String>,
        proxy: bool,
    ) -> Self {
        Self {
            client,
            registry,
            binder_host: binder_host.into(),
            proxy,
        }
    }

    pub fn registry(&self) -> &LaunchRegistry {
        &self.registry
    }

    pub fn build_url(&self, environ: &EnvironSpec) -> String {
        format!(
            "{}/build/{}",
            self.binder_host.trim_end_matches('/'),
            environ.build_path()
        )
    }

    /// Launch an environ and wait until the launch service closes the stream
    pub async fn launch(&self, environ: EnvironSpec) -> Result<LaunchRecord> {
        self.start(environ).await.wait().await
    }

    /// Register a new launch and run it as a background task.
    ///
    /// The record is visible in the registry as soon as this returns.
    pub async fn start(&self, environ: EnvironSpec) -> LaunchHandle {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let url = self.build_url(&environ);

        info!(launch_id = %id, environ = %environ.name, version = %environ.version, url = %url, "Launching environ");
        let record = LaunchRecord::new(id.clone(), environ, url.clone(), Utc::now());
        self.registry.insert(record).await;

        let launcher = self.clone();
        let task_id = id.clone();
        let task = tokio::spawn(async move { launcher.run(&task_id, &url).await });

        LaunchHandle { id, task }
    }

    async fn run(&self, id: &str, url: &str) -> Result<LaunchRecord> {
        let outcome = self.follow_stream(id, url).await;

        let proxy = self.proxy;
        let now = Utc::now();
        match &outcome {
            Ok(()) => {
                self.registry.update(id, |r| r.complete(proxy, now)).await;
            }
            Err(e) => {
                warn!(launch_id = %id, error = %e, "Launch failed");
                self.registry.update(id, |r| r.abandon(now)).await;
            }
        }
        outcome?;

        let record = self
            .registry
            .get(id)
            .await
            .ok_or_else(|| BridgeError::UnknownLaunch(id.to_string()))?;
        info!(
            launch_id = %id,
            phase = ?record.phase,
            events = record.events.len(),
            connect_path = ?record.connect_path,
            "Launch stream ended"
        );
        Ok(record)
    }

    async fn follow_stream(&self, id: &str, url: &str) -> Result<()> {
        let response = self
            .client
            .get(url)
            .header(header::CONTENT_TYPE, "text/event-stream")
            .send()
            .await
            .map_err(|e| BridgeError::LaunchService(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BridgeError::LaunchService(format!(
                "{} returned {}: {}",
                url, status, body
            )));
        }

        let mut events = std::pin::pin!(decode_stream(response.bytes_stream()));
        while let Some(event) = events.next().await {
            let data = event?;
            debug!(launch_id = %id, event = %data, "Launch event");
            let changed = self
                .registry
                .update(id, |r| r.apply_event(data, Utc::now()))
                .await
                .flatten();
            match changed {
                Some(phase) if phase.is_terminal() => {
                    info!(launch_id = %id, phase = ?phase, "Launch reached final phase");
                }
                Some(phase) => info!(launch_id = %id, phase = ?phase, "Launch phase changed"),
                None => {}
            }
        }
        Ok(())
    }
}
