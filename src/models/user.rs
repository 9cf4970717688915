//! User model and request types.
//!
//! Users are keyed by the identity subject issued by the external identity
//! provider; the backend trusts it as-is.

use serde::{Deserialize, Serialize};

/// Discovery preferences stored as a JSON column.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserPreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_friendly: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noise_preference: Option<String>,
    #[serde(default)]
    pub vibe_preferences: Vec<String>,
    #[serde(default)]
    pub visit_purpose: Vec<String>,
    #[serde(default)]
    pub dietary_preferences: Vec<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
}

/// A user profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// External identity subject (primary key).
    pub subject: String,
    pub username: String,
    pub email: String,
    pub preferences: UserPreferences,
    pub total_checkins: i64,
    pub total_reviews: i64,
    pub push_notifications: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for creating a user. Creation is idempotent on `subject`:
/// posting an existing subject returns the stored profile.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub subject: String,
    pub username: String,
    pub email: String,
}

/// Request body for updating a user's preferences. Provided keys overwrite
/// the stored preferences; `push_notifications` lives in its own column.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub work_friendly: Option<bool>,
    #[serde(default)]
    pub noise_preference: Option<String>,
    #[serde(default)]
    pub vibe_preferences: Option<Vec<String>>,
    #[serde(default)]
    pub visit_purpose: Option<Vec<String>>,
    #[serde(default)]
    pub dietary_preferences: Option<Vec<String>>,
    #[serde(default)]
    pub amenities: Option<Vec<String>>,
    #[serde(default)]
    pub push_notifications: Option<bool>,
}
