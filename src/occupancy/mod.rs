//! Occupancy aggregation core.
//!
//! Converts a heterogeneous table-configuration payload into a single
//! occupancy percentage. The payload is an explicit sum type: either an
//! ordered list of per-table entries or a two-tier summary keyed by
//! table-size class. The percentage is truncated, never rounded.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// A single table in the list-form configuration.
///
/// `occupied_seats` is the canonical field name; `seats` is accepted as an
/// alias since both spellings exist in the wild.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub size: i64,
    #[serde(alias = "seats")]
    pub occupied_seats: i64,
}

/// Occupied/total tallies for one table-size class in the summary form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeatClassSummary {
    pub total: i64,
    pub occupied_seats: i64,
}

/// Summary-form configuration. Exactly two recognized size classes; any
/// other key makes the payload an unrecognized shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TableSummary {
    #[serde(rename = "2_seats_table")]
    pub two_seats_table: SeatClassSummary,
    #[serde(rename = "4_seats_table")]
    pub four_seats_table: SeatClassSummary,
}

/// Table-configuration payload, discriminated by JSON shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TableConfig {
    /// Ordered list of individual tables.
    Tables(Vec<TableEntry>),
    /// Per-size-class tallies.
    Summary(TableSummary),
}

/// Aggregated seat counts for a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatTotals {
    pub capacity: i64,
    pub occupied: i64,
}

impl SeatTotals {
    pub fn new(capacity: i64, occupied: i64) -> Self {
        Self { capacity, occupied }
    }

    /// Occupancy percentage, truncated to an integer. Zero capacity maps to
    /// zero rather than an error.
    pub fn level(&self) -> i64 {
        if self.capacity > 0 {
            self.occupied * 100 / self.capacity
        } else {
            0
        }
    }
}

impl TableConfig {
    /// Try to interpret a raw JSON value as a table configuration.
    ///
    /// Returns `None` for unrecognized shapes; callers decide whether that
    /// is fatal (dedicated occupancy endpoints) or logged-and-skipped
    /// (cafe PATCH).
    pub fn from_value(value: &serde_json::Value) -> Option<TableConfig> {
        serde_json::from_value(value.clone()).ok()
    }

    /// Check numeric ranges: list entries need size >= 1 and an occupied
    /// count within 0..=size; summary tallies must be non-negative.
    pub fn validate(&self) -> Result<(), AppError> {
        match self {
            TableConfig::Tables(entries) => {
                for (i, entry) in entries.iter().enumerate() {
                    if entry.size < 1 {
                        return Err(AppError::Validation(format!(
                            "Table entry {} has invalid size {}",
                            i, entry.size
                        )));
                    }
                    if entry.occupied_seats < 0 || entry.occupied_seats > entry.size {
                        return Err(AppError::Validation(format!(
                            "Table entry {} has occupied_seats {} outside 0..={}",
                            i, entry.occupied_seats, entry.size
                        )));
                    }
                }
                Ok(())
            }
            TableConfig::Summary(summary) => {
                for (name, class) in [
                    ("2_seats_table", &summary.two_seats_table),
                    ("4_seats_table", &summary.four_seats_table),
                ] {
                    if class.total < 0 || class.occupied_seats < 0 {
                        return Err(AppError::Validation(format!(
                            "{} has negative counts",
                            name
                        )));
                    }
                }
                Ok(())
            }
        }
    }

    /// Sum capacity and occupied seats across the configuration.
    pub fn totals(&self) -> SeatTotals {
        match self {
            TableConfig::Tables(entries) => SeatTotals {
                capacity: entries.iter().map(|e| e.size).sum(),
                occupied: entries.iter().map(|e| e.occupied_seats).sum(),
            },
            TableConfig::Summary(summary) => SeatTotals {
                capacity: summary.two_seats_table.total * 2 + summary.four_seats_table.total * 4,
                occupied: summary.two_seats_table.occupied_seats
                    + summary.four_seats_table.occupied_seats,
            },
        }
    }

    /// Occupancy percentage for this configuration.
    pub fn occupancy_level(&self) -> i64 {
        self.totals().level()
    }
}
