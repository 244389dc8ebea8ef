// src/server/mod.rs
// Axum HTTP server exposing the bridge

mod path;
pub mod routes;

pub use path::{ApiRoute, ApiVersion};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::get,
};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::bridge::Bridge;

const SERVER_NAME: &str = concat!("Bindilla/", env!("CARGO_PKG_VERSION"));

/// Create the axum router with all bridge routes
pub fn create_router(bridge: Bridge) -> Router {
    // Credentialed requests need the concrete origin, not `*`
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(86400));

    Router::new()
        .route("/", get(routes::index))
        .route("/health", get(routes::health))
        .fallback(routes::dispatch)
        .layer(SetResponseHeaderLayer::overriding(
            header::SERVER,
            HeaderValue::from_static(SERVER_NAME),
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(bridge)
}

/// Bind and serve until the process is stopped
pub async fn serve(bridge: Bridge, address: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(address).await?;
    tracing::info!("Bindilla listening on http://{}", listener.local_addr()?);

    let app = create_router(bridge);
    axum::serve(listener, app).await?;

    Ok(())
}
