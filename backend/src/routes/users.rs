//! User profile, schedule, reminder and progress routes

use crate::error::ApiError;
use crate::services::{
    DailySchedule, ProfileService, ProfileUpdate, ProgressReport, ProgressService,
    ScheduleService,
};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use fitness_coach_shared::{Reminder, UserProfile};
use serde::Deserialize;

/// Create per-user routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/:user_id/profile", get(get_profile).put(update_profile))
        .route("/:user_id/schedule", post(generate_schedule))
        .route("/:user_id/reminders", get(list_reminders))
        .route("/:user_id/progress", get(get_progress))
}

/// Optional `?date=YYYY-MM-DD` filter
#[derive(Debug, Default, Deserialize)]
pub struct DateQuery {
    pub date: Option<NaiveDate>,
}

/// GET /api/v1/users/:user_id/profile
async fn get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserProfile>, ApiError> {
    let profile = ProfileService::get_profile(state.store(), user_id).await?;
    Ok(Json(profile))
}

/// PUT /api/v1/users/:user_id/profile
async fn update_profile(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(req): Json<ProfileUpdate>,
) -> Result<Json<UserProfile>, ApiError> {
    let profile = ProfileService::upsert_profile(state.store(), user_id, req).await?;
    Ok(Json(profile))
}

/// POST /api/v1/users/:user_id/schedule - generate the day's plans and reminders
///
/// Defaults to today's local date.
async fn generate_schedule(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(query): Query<DateQuery>,
) -> Result<Json<DailySchedule>, ApiError> {
    let date = query
        .date
        .unwrap_or_else(|| state.clock.local_now().date());
    let schedule = ScheduleService::generate_daily_schedule(
        state.store(),
        state.generator.as_ref(),
        user_id,
        date,
    )
    .await?;
    Ok(Json(schedule))
}

/// GET /api/v1/users/:user_id/reminders
async fn list_reminders(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(query): Query<DateQuery>,
) -> Result<Json<Vec<Reminder>>, ApiError> {
    let reminders = state.store().user_reminders(user_id, query.date).await?;
    Ok(Json(reminders))
}

/// GET /api/v1/users/:user_id/progress
async fn get_progress(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<ProgressReport>, ApiError> {
    let report = ProgressService::user_progress(state.store(), user_id).await?;
    Ok(Json(report))
}
