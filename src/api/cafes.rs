//! Cafe API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{created, error, success, ApiResult};
use crate::errors::AppError;
use crate::models::{Cafe, CreateCafeRequest, UpdateCafeRequest};
use crate::AppState;

/// GET /cafes - List all cafes.
pub async fn list_cafes(State(state): State<AppState>) -> ApiResult<Vec<Cafe>> {
    match state.repo.list_cafes().await {
        Ok(cafes) => success(cafes),
        Err(e) => error(e),
    }
}

/// GET /cafes/:cafe_id - Get a single cafe.
pub async fn get_cafe(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Cafe> {
    match state.repo.get_cafe(&id).await {
        Ok(Some(cafe)) => success(cafe),
        Ok(None) => error(AppError::NotFound(format!("Cafe {} not found", id))),
        Err(e) => error(e),
    }
}

/// POST /cafes - Create a new cafe.
pub async fn create_cafe(
    State(state): State<AppState>,
    Json(request): Json<CreateCafeRequest>,
) -> ApiResult<Cafe> {
    // Validate required fields
    if request.name.trim().is_empty() {
        return error(AppError::Validation("Name is required".to_string()));
    }
    if request.address.trim().is_empty() {
        return error(AppError::Validation("Address is required".to_string()));
    }
    if request.city.trim().is_empty() {
        return error(AppError::Validation("City is required".to_string()));
    }
    if request.owner_sub.trim().is_empty() {
        return error(AppError::Validation("Owner subject is required".to_string()));
    }

    match state.repo.create_cafe(&request).await {
        Ok(cafe) => created(cafe),
        Err(e) => error(e),
    }
}

/// PATCH /cafes/:cafe_id - Partially update a cafe.
///
/// A table_config value in the body triggers occupancy recomputation and a
/// history snapshot as a side effect.
pub async fn update_cafe(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateCafeRequest>,
) -> ApiResult<Cafe> {
    match state.repo.update_cafe(&id, &request).await {
        Ok(cafe) => success(cafe),
        Err(e) => error(e),
    }
}

/// DELETE /cafes/:cafe_id - Delete a cafe and its dependent records.
pub async fn delete_cafe(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    match state.repo.delete_cafe(&id).await {
        Ok(()) => success(()),
        Err(e) => error(e),
    }
}
