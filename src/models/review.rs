//! Review model and request types.

use serde::{Deserialize, Serialize};

/// A review of a cafe. At most one per (user, cafe) per local calendar day,
/// gated on a same-day check-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub cafe_id: String,
    pub user_sub: String,
    pub rating: i64,
    pub review_text: String,
    pub created_at: String,
    /// Reviewer display name, joined in for responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Request body for creating a review.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateReviewRequest {
    pub cafe_id: String,
    pub user_sub: String,
    pub rating: i64,
    pub review_text: String,
}
