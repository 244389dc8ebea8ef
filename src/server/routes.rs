// src/server/routes.rs
// HTTP handlers for the bridge API

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{Method, StatusCode, Uri, header},
    response::{Html, IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::bridge::Bridge;
use crate::error::BridgeError;
use crate::launch::Phase;
use crate::proxy::ProxyOutcome;
use crate::server::path::ApiRoute;

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8">
        <meta name="viewport" content="width=device-width">
        <style>
            p {
                margin: 3em auto;
                width: 20em;
                font-family: sans-serif;
                font-size: 1.2em;
                color: #444;
                text-align: center;
            }
        </style>
    </head>
    <body>
        <p>Hello. I'm <a href="https://github.com/stencila/bindilla">Bindilla</a>, a bridge between Stencila and Binder</p>
    </body>
</html>
"#;

/// Index page
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Serialize)]
struct NotReadyResponse {
    ready: bool,
    phase: Option<Phase>,
}

/// Dispatch versioned API paths (`[/prefix]/v0/...` and `[/prefix]/v1/...`)
pub async fn dispatch(
    State(bridge): State<Bridge>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Result<Response, BridgeError> {
    let Some(route) = ApiRoute::parse(uri.path())? else {
        return Ok(not_found(uri.path()));
    };
    debug!(method = %method, route = ?route, "API request");

    match (route, method) {
        (ApiRoute::Manifest { extra }, Method::GET) => {
            Ok(Json(bridge.manifest(&extra)?).into_response())
        }

        (ApiRoute::Environ { target }, Method::POST) => {
            if wait_requested(&uri) {
                let record = bridge.launch_environ(&target).await?;
                Ok(Json(record).into_response())
            } else {
                let handle = bridge.start_environ(&target).await?;
                let record = bridge.inspect_environ(&handle.id).await?;
                Ok((StatusCode::ACCEPTED, Json(record)).into_response())
            }
        }
        (ApiRoute::Environ { target }, Method::GET) => {
            Ok(Json(bridge.inspect_environ(&target).await?).into_response())
        }

        (ApiRoute::Proxy { launch_id, path }, method)
            if matches!(method, Method::GET | Method::POST | Method::PUT | Method::DELETE) =>
        {
            let path = match uri.query() {
                Some(query) => format!("{}?{}", path, query),
                None => path,
            };
            let body = (!body.is_empty()).then_some(body);
            match bridge.proxy(method, &launch_id, &path, body).await? {
                ProxyOutcome::NotReady { phase } => Ok((
                    StatusCode::ACCEPTED,
                    Json(NotReadyResponse {
                        ready: false,
                        phase,
                    }),
                )
                    .into_response()),
                ProxyOutcome::Response { status, body } => Ok((
                    status,
                    [(header::CONTENT_TYPE, "application/json")],
                    body,
                )
                    .into_response()),
            }
        }

        (_, Method::OPTIONS) => Ok(StatusCode::NO_CONTENT.into_response()),
        (_, method) => Ok(method_not_allowed(&method)),
    }
}

/// `?wait=false` (or `0`/`no`) starts the launch in the background
fn wait_requested(uri: &Uri) -> bool {
    let Some(query) = uri.query() else {
        return true;
    };
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "wait")
        .map(|(_, value)| !matches!(&*value, "false" | "0" | "no"))
        .unwrap_or(true)
}

fn not_found(path: &str) -> Response {
    error_response(StatusCode::NOT_FOUND, "not_found", &format!("no route for {}", path))
}

fn method_not_allowed(method: &Method) -> Response {
    error_response(
        StatusCode::METHOD_NOT_ALLOWED,
        "method_not_allowed",
        &format!("{} is not supported here", method),
    )
}

fn error_response(status: StatusCode, kind: &str, message: &str) -> Response {
    let body = json!({
        "error": {
            "type": kind,
            "message": message
        }
    });
    (status, Json(body)).into_response()
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        let status = match &self {
            BridgeError::InvalidEnviron(_) => StatusCode::BAD_REQUEST,
            BridgeError::UnknownLaunch(_) => StatusCode::NOT_FOUND,
            BridgeError::LaunchService(_)
            | BridgeError::StreamDecode(_)
            | BridgeError::Target(_) => StatusCode::BAD_GATEWAY,
            BridgeError::Config(_) | BridgeError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if !self.is_client_error() {
            warn!(status = %status, error = %self, "Request failed");
        }
        error_response(status, self.kind(), &self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_requested() {
        let uri = |s: &str| s.parse::<Uri>().unwrap();
        assert!(wait_requested(&uri("/v1/environs/gh/a/b")));
        assert!(wait_requested(&uri("/v1/environs/gh/a/b?wait=true")));
        assert!(wait_requested(&uri("/v1/environs/gh/a/b?other=1")));
        assert!(!wait_requested(&uri("/v1/environs/gh/a/b?wait=false")));
        assert!(!wait_requested(&uri("/v1/environs/gh/a/b?x=1&wait=0")));
    }

    #[test]
    fn test_error_status_codes() {
        let status = |e: BridgeError| e.into_response().status();
        assert_eq!(status(BridgeError::InvalidEnviron("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status(BridgeError::UnknownLaunch("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status(BridgeError::LaunchService("x".into())), StatusCode::BAD_GATEWAY);
        assert_eq!(status(BridgeError::StreamDecode("x".into())), StatusCode::BAD_GATEWAY);
        assert_eq!(status(BridgeError::Target("x".into())), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status(BridgeError::Config("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
