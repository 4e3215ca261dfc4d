//! Telegram webhook

use crate::error::ApiError;
use crate::services::CallbackService;
use crate::state::AppState;
use crate::transport::telegram::Update;
use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};
use serde_json::{json, Value};
use tracing::warn;

const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/telegram", post(telegram_update))
}

/// POST /webhook/telegram - callback taps from the chat
///
/// Always answers 200 once the secret matches so Telegram does not redeliver;
/// failures are reported to the user in chat instead.
async fn telegram_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(update): Json<Update>,
) -> Result<Json<Value>, ApiError> {
    let expected = &state.config().telegram.webhook_secret;
    if !expected.is_empty() {
        let provided = headers
            .get(SECRET_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if provided != expected {
            warn!(update_id = update.update_id, "Rejected webhook with bad secret");
            return Err(ApiError::Unauthorized("Invalid webhook secret".to_string()));
        }
    }

    CallbackService::handle_update(&state, update).await;
    Ok(Json(json!({ "ok": true })))
}
