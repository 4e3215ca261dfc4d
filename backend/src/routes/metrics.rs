//! Prometheus exposition endpoint

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse};

/// GET /metrics - 404 when no recorder is installed
pub async fn render_metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed".to_string()),
    }
}
