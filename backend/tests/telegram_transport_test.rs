//! Telegram Bot API transport against a mock server

use fitness_coach_backend::config::TelegramConfig;
use fitness_coach_backend::transport::{
    MessageRef, NotificationTransport, TelegramTransport, TransportError,
};
use fitness_coach_shared::{CallbackAction, Control, Notification};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "123456:test-token";

fn transport(server: &MockServer) -> TelegramTransport {
    TelegramTransport::new(&TelegramConfig {
        api_url: server.uri(),
        bot_token: TOKEN.to_string(),
        webhook_secret: String::new(),
    })
}

#[tokio::test]
async fn test_send_message_with_keyboard() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{}/sendMessage", TOKEN)))
        .and(body_partial_json(json!({
            "chat_id": 42,
            "parse_mode": "Markdown",
            "reply_markup": {
                "inline_keyboard": [[{ "text": "📊 View Progress", "callback_data": "progress" }]]
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": { "message_id": 77, "chat": { "id": 42 }, "text": "hello" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let notification = Notification::with_controls(
        "hello",
        vec![vec![Control::new("📊 View Progress", CallbackAction::ShowProgress)]],
    );
    let sent = transport(&server).send(42, &notification).await.unwrap();

    assert_eq!(
        sent,
        MessageRef {
            chat_id: 42,
            message_id: 77
        }
    );
}

#[tokio::test]
async fn test_edit_and_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{}/editMessageText", TOKEN)))
        .and(body_partial_json(json!({ "chat_id": 42, "message_id": 77 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": { "message_id": 77, "chat": { "id": 42 } }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{}/answerCallbackQuery", TOKEN)))
        .and(body_partial_json(json!({ "callback_query_id": "cb-1", "text": "done" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "result": true })))
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport(&server);
    transport
        .edit(
            MessageRef {
                chat_id: 42,
                message_id: 77,
            },
            &Notification::text("updated"),
        )
        .await
        .unwrap();
    transport.answer_callback("cb-1", Some("done")).await.unwrap();
}

#[tokio::test]
async fn test_rejection_carries_description() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{}/sendMessage", TOKEN)))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "ok": false,
            "error_code": 403,
            "description": "Forbidden: bot was blocked by the user"
        })))
        .mount(&server)
        .await;

    let err = transport(&server)
        .send(42, &Notification::text("hello"))
        .await
        .unwrap_err();

    match err {
        TransportError::Rejected {
            status,
            description,
        } => {
            assert_eq!(status, 403);
            assert!(description.contains("blocked"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_missing_token_never_calls_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let transport = TelegramTransport::new(&TelegramConfig {
        api_url: server.uri(),
        bot_token: String::new(),
        webhook_secret: String::new(),
    });
    let err = transport
        .send(42, &Notification::text("hello"))
        .await
        .unwrap_err();

    assert!(matches!(err, TransportError::NotConfigured));
}
