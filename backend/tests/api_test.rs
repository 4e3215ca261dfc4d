//! Profile, schedule and activity API

mod common;

use axum::http::StatusCode;
use common::{test_date, TestApp};
use serde_json::{json, Value};
use uuid::Uuid;

#[tokio::test]
async fn test_profile_round_trip() {
    let app = TestApp::new();
    app.create_profile(42).await;

    let (status, body) = app.get("/api/v1/users/42/profile").await;
    assert_eq!(status, StatusCode::OK);
    let profile: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(profile["user_id"], 42);
    assert_eq!(profile["workout_time"], "07:00:00");
    assert_eq!(profile["fitness_level"], "intermediate");
}

#[tokio::test]
async fn test_missing_profile_is_404() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/v1/users/42/profile").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("NOT_FOUND"));
}

#[tokio::test]
async fn test_invalid_profile_is_rejected() {
    let app = TestApp::new();

    let (status, body) = app
        .put(
            "/api/v1/users/42/profile",
            &json!({ "age": 4, "workout_time": "07:00" }).to_string(),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("VALIDATION_ERROR"));

    let (status, _) = app
        .put(
            "/api/v1/users/42/profile",
            &json!({ "dinner_time": "7pm" }).to_string(),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.get("/api/v1/users/42/profile").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_schedule_requires_complete_profile() {
    let app = TestApp::new();

    let (status, _) = app.post("/api/v1/users/42/schedule", "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    app.put(
        "/api/v1/users/42/profile",
        &json!({ "age": 30 }).to_string(),
    )
    .await;
    let (status, body) = app.post("/api/v1/users/42/schedule", "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("incomplete"));
}

#[tokio::test]
async fn test_schedule_defaults_to_today() {
    let app = TestApp::new();
    app.create_profile(42).await;

    let (status, body) = app.post("/api/v1/users/42/schedule", "").await;
    assert_eq!(status, StatusCode::OK);
    let schedule: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(schedule["workout"]["scheduled_date"], test_date().to_string());
    assert_eq!(schedule["used_fallback"], true);
}

#[tokio::test]
async fn test_reminders_listed_by_date() {
    let app = TestApp::new();
    app.create_profile(42).await;
    app.create_schedule(42).await;

    let (status, body) = app
        .get(&format!("/api/v1/users/42/reminders?date={}", test_date()))
        .await;
    assert_eq!(status, StatusCode::OK);
    let reminders: Value = serde_json::from_str(&body).unwrap();
    let reminders = reminders.as_array().unwrap();
    assert_eq!(reminders.len(), 2);
    assert_eq!(reminders[0]["category"], "workout");
    assert_eq!(reminders[0]["fire_time"], "06:55:00");
    assert_eq!(reminders[1]["category"], "dinner");
    assert_eq!(reminders[1]["fire_time"], "18:55:00");

    let (_, body) = app.get("/api/v1/users/42/reminders?date=2026-03-03").await;
    assert_eq!(body, "[]");
}

#[tokio::test]
async fn test_progress_endpoint() {
    let app = TestApp::new();
    app.create_profile(42).await;
    app.create_schedule(42).await;

    let (status, body) = app.get("/api/v1/users/42/progress").await;
    assert_eq!(status, StatusCode::OK);
    let report: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(report["workouts"]["total"], 1);
    assert_eq!(report["diets"]["total"], 1);
    assert_eq!(report["meals"]["total"], 5);
}

#[tokio::test]
async fn test_unknown_activity_is_404() {
    let app = TestApp::new();

    let (status, body) = app
        .get(&format!("/api/v1/activities/diet/{}", Uuid::new_v4()))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Diet plan not found"));
}

#[tokio::test]
async fn test_unknown_activity_kind_is_400() {
    let app = TestApp::new();

    let (status, _) = app
        .get(&format!("/api/v1/activities/yoga/{}", Uuid::new_v4()))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_store_outage_is_503() {
    let app = TestApp::new();
    app.store.set_unavailable(true);

    let (status, body) = app.get("/api/v1/users/42/progress").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body.contains("STORE_UNAVAILABLE"));
}
