//! Live update ("story") API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{created, error, success, ApiResult};
use crate::errors::AppError;
use crate::models::{CreateLiveUpdateRequest, LiveUpdate};
use crate::AppState;

/// POST /liveUpdates - Create a live update from a pre-uploaded image URL.
///
/// The URL comes from the blob-store upload collaborator and is stored
/// verbatim.
pub async fn create_live_update(
    State(state): State<AppState>,
    Json(request): Json<CreateLiveUpdateRequest>,
) -> ApiResult<LiveUpdate> {
    if request.image_url.trim().is_empty() {
        return error(AppError::Validation("Image URL is required".to_string()));
    }

    match state.repo.create_live_update(&request).await {
        Ok(update) => created(update),
        Err(e) => error(e),
    }
}

/// GET /liveUpdates/cafe/:cafe_id - Active live updates for a cafe.
pub async fn get_cafe_live_updates(
    State(state): State<AppState>,
    Path(cafe_id): Path<String>,
) -> ApiResult<Vec<LiveUpdate>> {
    match state.repo.cafe_live_updates(&cafe_id).await {
        Ok(updates) => success(updates),
        Err(e) => error(e),
    }
}

/// GET /liveUpdates/user/:subject - Active live updates posted by a user,
/// with cafe names for display.
pub async fn get_user_live_updates(
    State(state): State<AppState>,
    Path(subject): Path<String>,
) -> ApiResult<Vec<LiveUpdate>> {
    match state.repo.user_live_updates(&subject).await {
        Ok(updates) => success(updates),
        Err(e) => error(e),
    }
}
