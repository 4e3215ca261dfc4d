//! Activity detail routes

use crate::error::ApiError;
use crate::services::reconciler::not_found_label;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use fitness_coach_shared::{Activity, ActivityKind, ItemCompletion};
use serde::Serialize;
use uuid::Uuid;

pub fn activity_routes() -> Router<AppState> {
    Router::new().route("/:kind/:id", get(get_activity))
}

/// An activity with every recorded item outcome
#[derive(Debug, Serialize)]
pub struct ActivityDetail {
    #[serde(flatten)]
    pub activity: Activity,
    pub completions: Vec<ItemCompletion>,
}

/// GET /api/v1/activities/:kind/:id
async fn get_activity(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, Uuid)>,
) -> Result<Json<ActivityDetail>, ApiError> {
    let kind: ActivityKind = kind.parse()?;
    let activity = state
        .store()
        .get_activity(kind, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("{} not found", not_found_label(kind))))?;
    let completions = state.store().list_item_completions(kind, id).await?;

    Ok(Json(ActivityDetail {
        activity,
        completions,
    }))
}
