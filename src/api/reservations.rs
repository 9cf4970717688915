//! Reservation API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{created, error, success, ApiResult};
use crate::errors::AppError;
use crate::models::{CreateReservationRequest, Reservation, UpdateReservationRequest};
use crate::AppState;

/// POST /reservations - Create a reservation.
pub async fn create_reservation(
    State(state): State<AppState>,
    Json(request): Json<CreateReservationRequest>,
) -> ApiResult<Reservation> {
    if !(1..=20).contains(&request.party_size) {
        return error(AppError::Validation(
            "Party size must be between 1 and 20".to_string(),
        ));
    }

    match state.repo.create_reservation(&request).await {
        Ok(reservation) => created(reservation),
        Err(e) => error(e),
    }
}

/// GET /reservations/user/:subject - Reservations made by a user.
pub async fn get_user_reservations(
    State(state): State<AppState>,
    Path(subject): Path<String>,
) -> ApiResult<Vec<Reservation>> {
    match state.repo.user_reservations(&subject).await {
        Ok(reservations) => success(reservations),
        Err(e) => error(e),
    }
}

/// GET /reservations/cafe/:cafe_id - Reservations at a cafe.
pub async fn get_cafe_reservations(
    State(state): State<AppState>,
    Path(cafe_id): Path<String>,
) -> ApiResult<Vec<Reservation>> {
    match state.repo.cafe_reservations(&cafe_id).await {
        Ok(reservations) => success(reservations),
        Err(e) => error(e),
    }
}

/// PATCH /reservations/:id - Update a reservation (status, rescheduling).
pub async fn update_reservation(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateReservationRequest>,
) -> ApiResult<Reservation> {
    if let Some(party_size) = request.party_size {
        if !(1..=20).contains(&party_size) {
            return error(AppError::Validation(
                "Party size must be between 1 and 20".to_string(),
            ));
        }
    }

    match state.repo.update_reservation(&id, &request).await {
        Ok(reservation) => success(reservation),
        Err(e) => error(e),
    }
}

/// DELETE /reservations/:id - Cancel a reservation.
pub async fn delete_reservation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    match state.repo.delete_reservation(&id).await {
        Ok(()) => success(()),
        Err(e) => error(e),
    }
}
