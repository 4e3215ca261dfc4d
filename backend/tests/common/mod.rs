//! Common test utilities for integration tests
//!
//! The app runs against the in-memory store, a recording transport and a
//! fixed clock so reminder delivery can be driven tick by tick.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use fitness_coach_backend::{
    clock::FixedClock,
    config::AppConfig,
    routes,
    services::ReminderDispatcher,
    state::AppState,
    store::MemoryStore,
    transport::{RecordingTransport, SentMessage},
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

/// Date every test schedules for
pub fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

pub fn at(hour: u32, minute: u32) -> NaiveDateTime {
    test_date().and_time(NaiveTime::from_hms_opt(hour, minute, 0).unwrap())
}

/// Test application wrapper
pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub transport: Arc<RecordingTransport>,
    pub clock: Arc<FixedClock>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let transport = Arc::new(RecordingTransport::new());
        let clock = Arc::new(FixedClock::new(at(6, 0)));

        let state = AppState::new(store.clone(), transport.clone(), config)
            .with_clock(clock.clone());
        let app = routes::create_router(state.clone());

        Self {
            app,
            state,
            store,
            transport,
            clock,
        }
    }

    pub fn dispatcher(&self) -> ReminderDispatcher {
        ReminderDispatcher::from_state(&self.state)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Make a POST request with JSON body
    pub async fn post(&self, path: &str, body: &str) -> (StatusCode, String) {
        self.post_with_header(path, body, None).await
    }

    /// Make a PUT request with JSON body
    pub async fn put(&self, path: &str, body: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("PUT")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Make a POST request with an optional extra header
    pub async fn post_with_header(
        &self,
        path: &str,
        body: &str,
        header: Option<(&str, &str)>,
    ) -> (StatusCode, String) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json");
        if let Some((name, value)) = header {
            builder = builder.header(name, value);
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, String) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body_str = String::from_utf8(body.to_vec()).unwrap();

        (status, body_str)
    }

    /// Store a complete profile with workout at 07:00 and dinner at 19:00
    pub async fn create_profile(&self, user_id: i64) {
        let (status, body) = self
            .put(
                &format!("/api/v1/users/{}/profile", user_id),
                &json!({
                    "first_name": "Sam",
                    "age": 31,
                    "height_cm": 172.0,
                    "weight_kg": 70.5,
                    "fitness_level": "intermediate",
                    "goals": "Build strength",
                    "workout_time": "07:00",
                    "dinner_time": "19:00"
                })
                .to_string(),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
    }

    /// Generate the test date's schedule and return the response body
    pub async fn create_schedule(&self, user_id: i64) -> Value {
        let (status, body) = self
            .post(
                &format!("/api/v1/users/{}/schedule?date={}", user_id, test_date()),
                "",
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        serde_json::from_str(&body).unwrap()
    }

    /// Deliver a callback tap through the webhook
    pub async fn tap(&self, update: Value) -> (StatusCode, String) {
        self.post("/webhook/telegram", &update.to_string()).await
    }
}

/// Webhook update for a tap on `data`, optionally attached to a sent message
pub fn callback_update(user_id: i64, data: &str, message: Option<&SentMessage>) -> Value {
    let mut query = json!({
        "id": format!("cb-{}", data),
        "from": { "id": user_id, "first_name": "Sam" },
        "data": data,
    });
    if let Some(sent) = message {
        let keyboard: Vec<Vec<Value>> = sent
            .notification
            .controls
            .iter()
            .map(|row| {
                row.iter()
                    .map(|c| json!({ "text": c.label, "callback_data": c.action.encode() }))
                    .collect()
            })
            .collect();
        query["message"] = json!({
            "message_id": sent.message.message_id,
            "chat": { "id": sent.message.chat_id },
            "text": sent.notification.text,
            "reply_markup": { "inline_keyboard": keyboard },
        });
    }
    json!({ "update_id": 1, "callback_query": query })
}
