//! Cafe model and request types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Opening hours for a single weekday.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WorkingHoursDay {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close: Option<String>,
    #[serde(default)]
    pub closed: bool,
}

/// Working hours keyed by weekday name.
pub type WorkingHours = HashMap<String, WorkingHoursDay>;

/// A cafe as stored and returned to clients.
///
/// `table_config` is kept as raw JSON: valid payloads are one of the two
/// recognized shapes (see the occupancy module), but malformed submissions
/// are stored verbatim without recomputing `occupancy_level`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cafe {
    pub id: String,
    /// Identity subject of the owning account (externally authenticated).
    pub owner_sub: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub address: String,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub menu_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instagram_url: Option<String>,
    #[serde(default)]
    pub cafe_photos: Vec<String>,
    #[serde(default)]
    pub menu_photos: Vec<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub working_hours: WorkingHours,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_config: Option<serde_json::Value>,
    /// Derived: last successfully computed occupancy aggregate (0-100).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupancy_level: Option<i64>,
    /// Derived: arithmetic mean of all review ratings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_rating: Option<f64>,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for creating a new cafe.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCafeRequest {
    pub owner_sub: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    pub address: String,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub website_link: Option<String>,
    #[serde(default)]
    pub menu_link: Option<String>,
    #[serde(default)]
    pub instagram_url: Option<String>,
    #[serde(default)]
    pub cafe_photos: Vec<String>,
    #[serde(default)]
    pub menu_photos: Vec<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub working_hours: WorkingHours,
    #[serde(default)]
    pub table_config: Option<serde_json::Value>,
}

/// Request body for partially updating a cafe. Absent fields keep their
/// stored values; a `table_config` value additionally triggers occupancy
/// recomputation and a history snapshot.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCafeRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub website_link: Option<String>,
    #[serde(default)]
    pub menu_link: Option<String>,
    #[serde(default)]
    pub instagram_url: Option<String>,
    #[serde(default)]
    pub cafe_photos: Option<Vec<String>>,
    #[serde(default)]
    pub menu_photos: Option<Vec<String>>,
    #[serde(default)]
    pub amenities: Option<Vec<String>>,
    #[serde(default)]
    pub working_hours: Option<WorkingHours>,
    #[serde(default)]
    pub table_config: Option<serde_json::Value>,
}
