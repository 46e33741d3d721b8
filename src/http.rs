//! HTTP server for the health and Prometheus metrics endpoints.
//!
//! Runs on a separate tokio task. The provisioning operations themselves are
//! library calls; only `/health` and `/metrics` are served here.

use crate::provisioner::{Health, Provisioner};
use axum::extract::State;
use axum::{Json, Router, routing::get};
use std::net::SocketAddr;
use std::sync::Arc;

/// Handler for GET /metrics - returns Prometheus metrics in text format.
async fn metrics_handler() -> String {
    crate::metrics::gather_metrics()
}

/// Handler for GET /health - liveness probe.
async fn health_handler(State(provisioner): State<Arc<Provisioner>>) -> Json<Health> {
    Json(provisioner.health())
}

/// Run the HTTP server for the operational endpoints.
///
/// Binds to `0.0.0.0:port`. This is a long-running task that should be
/// spawned in the background.
pub async fn run_http_server(port: u16, provisioner: Arc<Provisioner>) {
    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(provisioner);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Operational HTTP server listening on {}", addr);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind HTTP server on {}: {}", addr, e);
            return;
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("HTTP server error: {}", e);
    }
}
