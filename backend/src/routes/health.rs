//! Liveness and readiness endpoints
//!
//! Readiness fails while the store is unreachable, since neither the
//! delivery loop nor the webhook can make progress without it. It also
//! reports how many reminders are due but unsent, so a stalled dispatcher
//! shows up as a growing backlog.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<StoreCheck>,
    /// Pending reminders whose fire instant has passed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_reminders: Option<usize>,
}

#[derive(Serialize)]
pub struct StoreCheck {
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthResponse {
    fn bare(status: &'static str) -> Self {
        Self {
            status,
            version: VERSION,
            store: None,
            due_reminders: None,
        }
    }
}

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::bare("healthy"))
}

/// GET /health/live - OK while the process serves requests
pub async fn liveness_check() -> Json<HealthResponse> {
    Json(HealthResponse::bare("alive"))
}

/// GET /health/ready - 503 while the store is unreachable
pub async fn readiness_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let store = state.store();
    let backlog = match store.health_check().await {
        Ok(()) => store.due_reminders(state.clock.local_now()).await.map(|due| due.len()),
        Err(e) => Err(e),
    };

    match backlog {
        Ok(due) => Ok(Json(HealthResponse {
            store: Some(StoreCheck {
                healthy: true,
                error: None,
            }),
            due_reminders: Some(due),
            ..HealthResponse::bare("ready")
        })),
        Err(e) => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                store: Some(StoreCheck {
                    healthy: false,
                    error: Some(e.to_string()),
                }),
                ..HealthResponse::bare("not_ready")
            }),
        )),
    }
}
