use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{Duration, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use super::types::{CleanupDto, HealthDto};
use super::{ApiError, ApiResponse, AppState};

const DEFAULT_CLEANUP_MAX_AGE_SECONDS: u64 = 24 * 60 * 60;

pub async fn health(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse<HealthDto>>, ApiError> {
    state
        .store()
        .ping()
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    Ok(Json(ApiResponse::success(HealthDto {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })))
}

pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.prometheus_handle.as_ref().map_or_else(
        || {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "metrics are disabled".to_string(),
            )
        },
        |handle| (StatusCode::OK, handle.render()),
    )
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CleanupParams {
    pub max_age_seconds: Option<u64>,
}

/// Drops cache entries and terminal requests older than the given age.
pub async fn run_cleanup(
    State(state): State<Arc<AppState>>,
    body: Option<Json<CleanupParams>>,
) -> Result<Json<ApiResponse<CleanupDto>>, ApiError> {
    let max_age = body
        .and_then(|Json(params)| params.max_age_seconds)
        .unwrap_or(DEFAULT_CLEANUP_MAX_AGE_SECONDS);

    let cache_entries_removed = state
        .shared
        .cache
        .cleanup(max_age)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    #[allow(clippy::cast_possible_wrap)]
    let cutoff = (Utc::now() - Duration::seconds(max_age as i64)).to_rfc3339();
    let requests_removed = state
        .store()
        .delete_requests_older_than(&cutoff)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    info!(max_age, cache_entries_removed, requests_removed, "cleanup finished");

    Ok(Json(ApiResponse::success(CleanupDto {
        cache_entries_removed,
        requests_removed,
    })))
}
