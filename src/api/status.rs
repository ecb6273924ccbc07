use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::background::{JobState, QueueSummary};

use super::{ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub struct RequestStatusDto {
    pub request_id: Uuid,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_state: Option<JobState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

pub async fn queue_status(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<QueueSummary>> {
    let summary = state.shared.background.status_summary().await;
    Json(ApiResponse::success(summary))
}

pub async fn request_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RequestStatusDto>>, ApiError> {
    let request = state
        .store()
        .get_request(id)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("Search request", id))?;

    let job_state = state.shared.background.get_status(id).await;

    Ok(Json(ApiResponse::success(RequestStatusDto {
        request_id: id,
        status: request.status.as_str().to_string(),
        job_state,
        result_count: request.result_count,
        error_message: request.error_message,
    })))
}
