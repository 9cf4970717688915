//! Reservation model and request types.

use serde::{Deserialize, Serialize};

/// A table reservation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: String,
    pub cafe_id: String,
    pub user_sub: String,
    pub reservation_date: String,
    /// Time of day, e.g. "14:00".
    pub reservation_time: String,
    pub party_size: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_request: Option<String>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
    /// Joined in for responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cafe_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

/// Request body for creating a reservation.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateReservationRequest {
    pub cafe_id: String,
    pub user_sub: String,
    pub reservation_date: String,
    pub reservation_time: String,
    #[serde(default = "default_party_size")]
    pub party_size: i64,
    #[serde(default)]
    pub special_request: Option<String>,
}

fn default_party_size() -> i64 {
    2
}

/// Request body for updating a reservation. Absent fields keep their stored
/// values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateReservationRequest {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub reservation_date: Option<String>,
    #[serde(default)]
    pub reservation_time: Option<String>,
    #[serde(default)]
    pub party_size: Option<i64>,
    #[serde(default)]
    pub special_request: Option<String>,
}
