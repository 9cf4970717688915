//! Review API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{created, error, success, ApiResult};
use crate::errors::AppError;
use crate::models::{CreateReviewRequest, Review};
use crate::AppState;

/// POST /reviews - Create a review.
///
/// Requires a same-day check-in at the cafe; at most one review per
/// (user, cafe) per day.
pub async fn create_review(
    State(state): State<AppState>,
    Json(request): Json<CreateReviewRequest>,
) -> ApiResult<Review> {
    if !(1..=5).contains(&request.rating) {
        return error(AppError::Validation(
            "Rating must be between 1 and 5".to_string(),
        ));
    }
    if request.review_text.trim().is_empty() {
        return error(AppError::Validation("Review text is required".to_string()));
    }

    match state.repo.create_review(&request).await {
        Ok(review) => created(review),
        Err(e) => error(e),
    }
}

/// GET /reviews/cafe/:cafe_id - Reviews for a cafe, newest first.
pub async fn get_cafe_reviews(
    State(state): State<AppState>,
    Path(cafe_id): Path<String>,
) -> ApiResult<Vec<Review>> {
    match state.repo.cafe_reviews(&cafe_id).await {
        Ok(reviews) => success(reviews),
        Err(e) => error(e),
    }
}
