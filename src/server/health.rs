//! Liveness and metrics endpoints
//!
//! - `/health` - Liveness: any method, always 200 with a fixed body
//! - `/metrics` - Prometheus metrics in text format

use crate::server::metrics::SharedMetrics;
use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, StatusCode},
    response::IntoResponse,
    routing::{any, get},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Content type of the Prometheus text exposition format
const METRICS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Shared state for the health and metrics handlers
#[derive(Clone)]
pub struct ServerState {
    metrics: SharedMetrics,
    health_body: Arc<str>,
}

impl ServerState {
    /// Create new server state
    ///
    /// `health_body` is returned verbatim by every liveness probe.
    pub fn new(metrics: SharedMetrics, health_body: impl Into<Arc<str>>) -> Self {
        Self {
            metrics,
            health_body: health_body.into(),
        }
    }
}

/// Liveness probe handler
///
/// Counts the request, then returns 200 OK with the configured body.
async fn health(State(state): State<ServerState>) -> (StatusCode, String) {
    state.metrics.record_request();
    (StatusCode::OK, state.health_body.to_string())
}

/// Prometheus metrics handler
///
/// Returns metrics in Prometheus text format for scraping.
async fn metrics(State(state): State<ServerState>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [(CONTENT_TYPE, METRICS_CONTENT_TYPE)],
            body,
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to encode metrics: {}", e),
        )
            .into_response(),
    }
}

/// Build the router for the health and metrics endpoints
pub fn build_router(state: ServerState) -> Router {
    Router::new()
        .route("/health", any(health))
        .route("/metrics", get(self::metrics))
        .with_state(state)
}

/// Bind the listener on all interfaces
///
/// Fails if the port is unavailable (e.g. already in use).
pub async fn bind(port: u16) -> Result<TcpListener, std::io::Error> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    // Log after successful bind - server is actually listening
    info!(port = %listener.local_addr()?.port(), "Server listening (HTTP)");
    Ok(listener)
}

/// Serve requests on an already bound listener
///
/// Each connection is handled on its own task. Runs until the process exits.
pub async fn serve(listener: TcpListener, state: ServerState) -> Result<(), std::io::Error> {
    let app = build_router(state);

    axum::serve(listener, app)
        .await
        .map_err(std::io::Error::other)
}
