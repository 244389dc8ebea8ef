// src/proxy.rs
// Forwards calls into launched containers using the launch's access token

use crate::error::{BridgeError, Result};
use crate::launch::{LaunchRegistry, Phase, TARGET_API_PATH};
use axum::body::Bytes;
use reqwest::{Client, Method, StatusCode, header};
use tracing::debug;

/// Result of a proxied call
#[derive(Debug, Clone, PartialEq)]
pub enum ProxyOutcome {
    /// The launch has not reached `ready`; try again later
    NotReady { phase: Option<Phase> },
    /// The container answered; status and body are passed through untouched
    Response { status: StatusCode, body: Bytes },
}

#[derive(Clone)]
pub struct Forwarder {
    client: Client,
    registry: LaunchRegistry,
}

impl Forwarder {
    pub fn new(client: Client, registry: LaunchRegistry) -> Self {
        Self { client, registry }
    }

    pub async fn forward(
        &self,
        method: Method,
        launch_id: &str,
        path: &str,
        body: Option<Bytes>,
    ) -> Result<ProxyOutcome> {
        let record = self
            .registry
            .get(launch_id)
            .await
            .ok_or_else(|| BridgeError::UnknownLaunch(launch_id.to_string()))?;

        if !record.is_ready() {
            debug!(launch_id = %launch_id, phase = ?record.phase, "Proxy call before launch is ready");
            return Ok(ProxyOutcome::NotReady {
                phase: record.phase,
            });
        }

        let base = record.target_base_url.as_deref().ok_or_else(|| {
            BridgeError::Target(format!("launch {} is ready but has no target URL", launch_id))
        })?;
        let token = record.token.as_deref().ok_or_else(|| {
            BridgeError::Target(format!("launch {} is ready but has no token", launch_id))
        })?;
        let url = target_url(base, path);

        let mut request = self
            .client
            .request(method.clone(), &url)
            .header(header::AUTHORIZATION, format!("token {}", token));
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| BridgeError::Target(format!("{} {} failed: {}", method, url, e)))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| BridgeError::Target(format!("reading response from {}: {}", url, e)))?;

        debug!(launch_id = %launch_id, method = %method, url = %url, status = %status, "Proxied call");
        Ok(ProxyOutcome::Response { status, body })
    }
}

/// `{base}/stencila-host/{path}` with exactly one slash at each join
pub fn target_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}/{}",
        base.trim_end_matches('/'),
        TARGET_API_PATH,
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environ;
    use crate::launch::LaunchRecord;
    use chrono::Utc;
    use serde_json::json;

    /// A registry holding one launch whose target points at a closed port,
    /// so any outbound request would fail with a Target error.
    async fn registry_with(events: &[serde_json::Value]) -> LaunchRegistry {
        let registry = LaunchRegistry::new();
        let mut record = LaunchRecord::new(
            "abc".to_string(),
            environ::parse("gh/acme/demo").unwrap(),
            "http://binder/build/gh/acme/demo/master".to_string(),
            Utc::now(),
        );
        for event in events {
            record.apply_event(event.clone(), Utc::now());
        }
        registry.insert(record).await;
        registry
    }

    #[test]
    fn test_target_url() {
        assert_eq!(
            target_url("http://x/", "/execute"),
            "http://x/stencila-host/execute"
        );
        assert_eq!(
            target_url("http://x/user/a", "v1/manifest"),
            "http://x/user/a/stencila-host/v1/manifest"
        );
    }

    #[tokio::test]
    async fn test_unknown_launch() {
        let forwarder = Forwarder::new(Client::new(), LaunchRegistry::new());
        let err = forwarder
            .forward(Method::GET, "missing", "manifest", None)
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::UnknownLaunch(id) if id == "missing"));
    }

    #[tokio::test]
    async fn test_not_ready_makes_no_request() {
        let registry = registry_with(&[json!({
            "phase": "launching",
            "url": "http://127.0.0.1:1/",
            "token": "T"
        })])
        .await;
        let forwarder = Forwarder::new(Client::new(), registry);
        let outcome = forwarder
            .forward(Method::POST, "abc", "execute", Some(Bytes::from_static(b"{}")))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            ProxyOutcome::NotReady {
                phase: Some(Phase::Launching)
            }
        );
    }

    #[tokio::test]
    async fn test_not_started_launch_is_not_ready() {
        let registry = registry_with(&[]).await;
        let forwarder = Forwarder::new(Client::new(), registry);
        let outcome = forwarder
            .forward(Method::GET, "abc", "manifest", None)
            .await
            .unwrap();
        assert_eq!(outcome, ProxyOutcome::NotReady { phase: None });
    }

    #[tokio::test]
    async fn test_ready_launch_with_unreachable_target() {
        let registry = registry_with(&[json!({
            "phase": "ready",
            "url": "http://127.0.0.1:1/",
            "token": "T"
        })])
        .await;
        let forwarder = Forwarder::new(Client::new(), registry);
        let err = forwarder
            .forward(Method::GET, "abc", "manifest", None)
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Target(_)));
    }

    #[tokio::test]
    async fn test_ready_launch_without_target_url() {
        let registry = registry_with(&[json!({"phase": "ready"})]).await;
        let forwarder = Forwarder::new(Client::new(), registry);
        let err = forwarder
            .forward(Method::GET, "abc", "manifest", None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no target URL"));
    }

    #[tokio::test]
    async fn test_ready_launch_without_token_sends_nothing() {
        // The target port is closed, so reaching it would surface a connect error instead
        let registry = registry_with(&[json!({
            "phase": "ready",
            "url": "http://127.0.0.1:1/"
        })])
        .await;
        let forwarder = Forwarder::new(Client::new(), registry);
        let err = forwarder
            .forward(Method::GET, "abc", "manifest", None)
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Target(_)));
        assert!(err.to_string().contains("no token"), "got {}", err);
    }
}
