//! Check-in model and request types.

use serde::{Deserialize, Serialize};

/// A timestamped record of a user's presence at a cafe. Same-day check-ins
/// gate review eligibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkin {
    pub id: String,
    pub cafe_id: String,
    pub user_sub: String,
    pub created_at: String,
}

/// Request body for creating a check-in.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCheckinRequest {
    pub cafe_id: String,
    pub user_sub: String,
}

/// Query parameters for the check-in status endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckinStatusQuery {
    pub user_sub: String,
    pub cafe_id: String,
}

/// Query parameters for the today's-check-ins endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TodayCheckinsQuery {
    pub user_sub: String,
}

/// "Checked in today" status for a (user, cafe) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckinStatus {
    pub checked_in_today: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_checkin: Option<String>,
}
