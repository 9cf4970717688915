//! Occupancy API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{created, error, success, ApiResult};
use crate::errors::AppError;
use crate::models::{OccupancyAck, OccupancyReport, OccupancySnapshot};
use crate::AppState;

/// POST /occupancy - Apply an occupancy report.
///
/// Recomputes the cafe's occupancy level from the seat tallies and appends
/// a history snapshot in the same transaction.
pub async fn record_occupancy(
    State(state): State<AppState>,
    Json(report): Json<OccupancyReport>,
) -> ApiResult<OccupancyAck> {
    let tallies = [
        report.two_tables,
        report.four_tables,
        report.two_table_seats,
        report.four_table_seats,
        report.two_tables_occupied,
        report.four_tables_occupied,
        report.two_seats_occupied,
        report.four_seats_occupied,
    ];
    if tallies.iter().any(|&n| n < 0) {
        return error(AppError::Validation(
            "Table and seat tallies must be non-negative".to_string(),
        ));
    }

    match state.repo.record_occupancy(&report).await {
        Ok(occupancy_level) => created(OccupancyAck { occupancy_level }),
        Err(e) => error(e),
    }
}

/// GET /occupancy/history/:cafe_id - History snapshots from the last 24
/// hours, oldest first.
pub async fn get_occupancy_history(
    State(state): State<AppState>,
    Path(cafe_id): Path<String>,
) -> ApiResult<Vec<OccupancySnapshot>> {
    match state.repo.get_cafe(&cafe_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return error(AppError::NotFound(format!("Cafe {} not found", cafe_id))),
        Err(e) => return error(e),
    }

    match state.repo.occupancy_history(&cafe_id).await {
        Ok(history) => success(history),
        Err(e) => error(e),
    }
}
