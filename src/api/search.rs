use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::{ApiError, ApiResponse, AppState};
use super::types::{QueuedDto, RequestDetailDto, SearchOutcomeDto, SearchSubmission};

/// Runs the whole pipeline inline and answers with the consolidated batch.
pub async fn run_search(
    State(state): State<Arc<AppState>>,
    Json(submission): Json<SearchSubmission>,
) -> Result<Json<ApiResponse<SearchOutcomeDto>>, ApiError> {
    let config = state.shared.config().await;
    let request = submission.into_request(&config)?;

    state
        .store()
        .create_request(&request)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    info!(request_id = %request.id, query = %request.query, "search accepted");

    let outcome = state.shared.background.process_immediately(&request).await?;
    Ok(Json(ApiResponse::success(outcome.into())))
}

/// Accepts the request and hands it to the background queue.
pub async fn queue_search(
    State(state): State<Arc<AppState>>,
    Json(submission): Json<SearchSubmission>,
) -> Result<Json<ApiResponse<QueuedDto>>, ApiError> {
    let config = state.shared.config().await;
    let request = submission.into_request(&config)?;

    state
        .store()
        .create_request(&request)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    let request_id = request.id;
    let queued = state.shared.background.queue_for_processing(request).await?;

    info!(%request_id, queued, "search queued");
    Ok(Json(ApiResponse::success(QueuedDto { request_id, queued })))
}

/// Returns a stored request with its unique results.
pub async fn get_search(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RequestDetailDto>>, ApiError> {
    let request = state
        .store()
        .get_request(id)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("Search request", id))?;

    let results = state
        .store()
        .get_unique_results(id)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    let relationships = state
        .store()
        .get_duplicate_relationships(id)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    Ok(Json(ApiResponse::success(RequestDetailDto {
        request,
        results,
        duplicates_removed: relationships.len() as u64,
    })))
}
