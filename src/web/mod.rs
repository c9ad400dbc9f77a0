//! HTTP surface: the check page plus a small JSON API
//!
//! - `GET /` check form and history
//! - `POST /predict` url-encoded form submission, re-renders the page
//! - `POST /api/predict` JSON submission
//! - `GET /api/history` logged predictions, most recent first
//! - `GET /health`, `GET /metrics`

pub mod page;
pub mod routes;

use crate::service::FraudService;
use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use tracing::info;

/// Build the application router
pub fn router(service: Arc<FraudService>) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/predict", post(routes::predict_form))
        .route("/api/predict", post(routes::predict_json))
        .route("/api/history", get(routes::history_json))
        .route("/health", get(routes::health))
        .route("/metrics", get(routes::metrics))
        .with_state(service)
}

/// Serve until `shutdown` resolves
pub async fn serve<F>(service: Arc<FraudService>, addr: &str, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    let local = listener.local_addr()?;

    info!("Fraud check server listening on {}", local);
    info!("  Form:     http://{}/", local);
    info!("  API:      http://{}/api/predict", local);
    info!("  History:  http://{}/api/history", local);
    info!("  Metrics:  http://{}/metrics", local);

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server error")
}
