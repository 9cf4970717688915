//! Check-in API endpoints.

use axum::{
    extract::{Query, State},
    Json,
};

use super::{created, error, success, ApiResult};
use crate::models::{
    Checkin, CheckinStatus, CheckinStatusQuery, CreateCheckinRequest, TodayCheckinsQuery,
};
use crate::AppState;

/// POST /checkins - Record a check-in.
pub async fn create_checkin(
    State(state): State<AppState>,
    Json(request): Json<CreateCheckinRequest>,
) -> ApiResult<Checkin> {
    match state.repo.create_checkin(&request).await {
        Ok(checkin) => created(checkin),
        Err(e) => error(e),
    }
}

/// GET /checkins/status?user_sub=&cafe_id= - Whether the user checked in at
/// the cafe today.
pub async fn get_checkin_status(
    State(state): State<AppState>,
    Query(query): Query<CheckinStatusQuery>,
) -> ApiResult<CheckinStatus> {
    match state
        .repo
        .checkin_status(&query.user_sub, &query.cafe_id)
        .await
    {
        Ok(status) => success(status),
        Err(e) => error(e),
    }
}

/// GET /checkins/today?user_sub= - Cafe IDs checked into today. Used to
/// initialize client state.
pub async fn get_today_checkins(
    State(state): State<AppState>,
    Query(query): Query<TodayCheckinsQuery>,
) -> ApiResult<Vec<String>> {
    match state.repo.today_checkins(&query.user_sub).await {
        Ok(cafe_ids) => success(cafe_ids),
        Err(e) => error(e),
    }
}
