use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;
use std::sync::Arc;

use crate::config::SeasonProbe;
use crate::AppState;

/// Root endpoint - basic status
pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "Media Normalizer",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "runtime": "rust"
    }))
}

/// Health check response
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    uptime: u64,
    upstream: String,
    fetch_timeout_ms: u64,
    season_probe: &'static str,
}

/// GET /health - Service health (does not contact the upstream)
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let season_probe = match state.config.season_probe {
        SeasonProbe::Contiguous => "contiguous",
        SeasonProbe::Tolerant { .. } => "tolerant",
    };

    Json(HealthResponse {
        status: "ok",
        uptime: state.start_time.elapsed().as_secs(),
        upstream: state.upstream.base_url().to_string(),
        fetch_timeout_ms: state.config.fetch_timeout_ms,
        season_probe,
    })
}

/// GET /metrics - Prometheus metrics
pub async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                b"Internal Server Error".to_vec(),
            )
        }
    }
}

/// Liveness probe (for Kubernetes)
pub async fn live() -> impl IntoResponse {
    (StatusCode::OK, "alive")
}
