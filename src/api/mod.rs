//! REST API module.
//!
//! Contains all API routes and handlers following the client contract.

mod cafes;
mod checkins;
mod live_updates;
mod occupancy;
mod reservations;
mod reviews;
mod users;

pub use cafes::*;
pub use checkins::*;
pub use live_updates::*;
pub use occupancy::*;
pub use reservations::*;
pub use reviews::*;
pub use users::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Success response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(skip_serializing)]
    pub status: StatusCode,
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        Self {
            status,
            success: true,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, crate::errors::AppError>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(ApiResponse::new(StatusCode::OK, data))
}

/// Create a successful API response for a newly created resource.
pub fn created<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(ApiResponse::new(StatusCode::CREATED, data))
}

/// Create an error API response.
pub fn error<T: Serialize>(err: crate::errors::AppError) -> ApiResult<T> {
    Err(err)
}
