use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use std::sync::Arc;

use crate::models::{MediaType, NormalizedMedia};
use crate::services::formatter::{format_movie, format_series};
use crate::services::upstream::FetchError;
use crate::AppState;

type ApiError = (StatusCode, Json<Value>);

fn resolve_type(kind: &str) -> Result<MediaType, ApiError> {
    MediaType::from_route(kind).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "Invalid type",
                "detail": "Invalid type. Use 'movies' or 'series'."
            })),
        )
    })
}

fn upstream_error(kind: &str, id: &str, e: FetchError) -> ApiError {
    tracing::error!("Upstream fetch failed for {}/{}: {}", kind, id, e);
    (
        StatusCode::BAD_GATEWAY,
        Json(serde_json::json!({
            "error": "Upstream request failed",
            "detail": e.to_string()
        })),
    )
}

/// GET /type/:type/:id - Fetch a record and normalize its stream listings
pub async fn get_by_type(
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Json<NormalizedMedia>, ApiError> {
    let media_type = resolve_type(&kind)?;

    let record = state
        .upstream
        .fetch_record(&kind, &id)
        .await
        .map_err(|e| upstream_error(&kind, &id, e))?;

    let media = match media_type {
        MediaType::Movie => format_movie(record),
        MediaType::Series => format_series(record, state.config.season_probe),
    };

    tracing::info!("Normalized {} {}", media_type, id);
    Ok(Json(media))
}

/// GET /raw/:type/:id - Upstream record passthrough
pub async fn get_raw(
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    resolve_type(&kind)?;

    let record = state
        .upstream
        .fetch_raw(&kind, &id)
        .await
        .map_err(|e| upstream_error(&kind, &id, e))?;

    Ok(Json(record))
}
