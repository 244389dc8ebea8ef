// tests/mock_binder.rs
// In-process stand-in for a Binder deployment and the container it launches

#![allow(dead_code)]

use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
    routing::{any, get},
};
use futures::StreamExt;
use serde_json::{Value, json};
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A full Binder launch transcript; `{base}` is replaced with the
/// mock's own address so the launched "container" is reachable
pub const BINDER_EVENTS: [&str; 5] = [
    r#"data: {"phase": "built", "imageName": "gcr.io/binder-prod/r2d-05168b0-stencila-2dimages", "message": "Found built image, launching...\n"}"#,
    r#"data: {"phase": "launching", "message": "Launching server...\n"}"#,
    ":keepalive",
    r#"data: {"phase": "ready", "message": "server running\n", "url": "{base}/user/x/", "token": "sRz1yukLTcapZUL9hEuA6Q"}"#,
    "",
];

pub struct MockBinder {
    pub base_url: String,
    state: Arc<MockState>,
}

struct MockState {
    base_url: String,
    events: Vec<String>,
    status: StatusCode,
    build_requests: Mutex<Vec<BuildRequest>>,
}

#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub path: String,
    pub content_type: Option<String>,
}

impl MockBinder {
    /// Serve `events` (one SSE block each) from `/build/...`
    pub async fn start(events: &[&str]) -> Self {
        Self::start_with_status(events, StatusCode::OK).await
    }

    pub async fn start_with_status(events: &[&str], status: StatusCode) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let state = Arc::new(MockState {
            base_url: base_url.clone(),
            events: events.iter().map(|e| e.replace("{base}", &base_url)).collect(),
            status,
            build_requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/build/{*path}", get(build))
            .route("/user/x/stencila-host/{*path}", any(host))
            .with_state(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, state }
    }

    pub fn build_requests(&self) -> Vec<BuildRequest> {
        self.state.build_requests.lock().unwrap().clone()
    }
}

/// Streams each event in two fragments so event boundaries never line up
/// with chunk boundaries
async fn build(State(state): State<Arc<MockState>>, uri: Uri, headers: HeaderMap) -> Response {
    state.build_requests.lock().unwrap().push(BuildRequest {
        path: uri.path().to_string(),
        content_type: headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    });

    if !state.status.is_success() {
        return (state.status, "build refused").into_response();
    }

    let mut chunks = Vec::new();
    for event in &state.events {
        let block = format!("{}\n\n", event);
        let mid = block.len() / 2;
        let mid = (mid..block.len()).find(|&i| block.is_char_boundary(i)).unwrap_or(mid);
        chunks.push(block[..mid].to_string());
        chunks.push(block[mid..].to_string());
    }
    let stream = futures::stream::iter(chunks).then(|chunk| async move {
        tokio::time::sleep(Duration::from_millis(5)).await;
        Ok::<_, Infallible>(Bytes::from(chunk))
    });

    Response::builder()
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(stream))
        .unwrap()
}

/// Echoes what the container received
async fn host(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Value> {
    Json(json!({
        "method": method.as_str(),
        "path": uri.path(),
        "query": uri.query(),
        "authorization": headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()),
        "body": String::from_utf8_lossy(&body),
    }))
}
