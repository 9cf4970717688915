//! Live update ("story") model and request types.

use serde::{Deserialize, Serialize};

/// A live photo update for a cafe. Expires 24 hours after creation.
///
/// `image_url` comes from the blob-store upload collaborator and is stored
/// verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveUpdate {
    pub id: String,
    pub cafe_id: String,
    pub user_sub: String,
    pub image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vibe: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visit_purpose: Option<String>,
    pub created_at: String,
    pub expires_at: String,
    /// Joined in for per-user listings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cafe_name: Option<String>,
}

/// Request body for creating a live update from a pre-uploaded image URL.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateLiveUpdateRequest {
    pub cafe_id: String,
    pub user_sub: String,
    pub image_url: String,
    #[serde(default)]
    pub vibe: Option<String>,
    #[serde(default)]
    pub visit_purpose: Option<String>,
}
