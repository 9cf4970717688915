//! Occupancy report and history snapshot types.

use serde::{Deserialize, Serialize};

/// Dedicated occupancy report: per-size-class table and seat tallies as
/// submitted by the cafe's counter device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OccupancyReport {
    pub cafe_id: String,
    pub two_tables: i64,
    pub four_tables: i64,
    pub two_table_seats: i64,
    pub four_table_seats: i64,
    pub two_tables_occupied: i64,
    pub four_tables_occupied: i64,
    pub two_seats_occupied: i64,
    pub four_seats_occupied: i64,
    /// Optional raw configuration, carried into the history snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_config: Option<serde_json::Value>,
}

/// Acknowledgement returned for an accepted occupancy report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OccupancyAck {
    pub occupancy_level: i64,
}

/// An immutable occupancy snapshot. Created only as a side effect of an
/// occupancy aggregation, never mutated, deleted only via cafe cascade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OccupancySnapshot {
    pub id: String,
    pub cafe_id: String,
    pub occupancy_level: i64,
    pub total_capacity: i64,
    pub total_occupied: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_config: Option<serde_json::Value>,
    pub created_at: String,
}
