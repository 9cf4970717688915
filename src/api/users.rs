//! User API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{created, error, success, ApiResult};
use crate::errors::AppError;
use crate::models::{CreateUserRequest, UpdateUserRequest, User};
use crate::AppState;

/// POST /users - Create a user. Idempotent on the identity subject.
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> ApiResult<User> {
    if request.subject.trim().is_empty() {
        return error(AppError::Validation("Subject is required".to_string()));
    }
    if request.username.trim().is_empty() {
        return error(AppError::Validation("Username is required".to_string()));
    }
    if request.email.trim().is_empty() {
        return error(AppError::Validation("Email is required".to_string()));
    }

    match state.repo.create_user(&request).await {
        Ok(user) => created(user),
        Err(e) => error(e),
    }
}

/// GET /users - List all users.
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Vec<User>> {
    match state.repo.list_users().await {
        Ok(users) => success(users),
        Err(e) => error(e),
    }
}

/// GET /users/:subject - Get a user by identity subject.
pub async fn get_user(
    State(state): State<AppState>,
    Path(subject): Path<String>,
) -> ApiResult<User> {
    match state.repo.get_user(&subject).await {
        Ok(Some(user)) => success(user),
        Ok(None) => error(AppError::NotFound(format!("User {} not found", subject))),
        Err(e) => error(e),
    }
}

/// PATCH /users/:subject - Update a user's preferences.
pub async fn update_user(
    State(state): State<AppState>,
    Path(subject): Path<String>,
    Json(request): Json<UpdateUserRequest>,
) -> ApiResult<User> {
    match state.repo.update_user(&subject, &request).await {
        Ok(user) => success(user),
        Err(e) => error(e),
    }
}
