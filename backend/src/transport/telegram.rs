//! Telegram Bot API transport and webhook payload types

use super::{MessageRef, NotificationTransport, TransportError};
use crate::config::TelegramConfig;
use async_trait::async_trait;
use fitness_coach_shared::{Control, Notification};
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

const PARSE_MODE: &str = "Markdown";

/// Sends and edits messages through the Bot API
pub struct TelegramTransport {
    client: Client,
    api_url: String,
    token: Secret<String>,
}

impl TelegramTransport {
    pub fn new(config: &TelegramConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: &TelegramConfig) -> Self {
        Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: Secret::new(config.bot_token.clone()),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.token.expose_secret().is_empty()
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: serde_json::Value,
    ) -> Result<T, TransportError> {
        if !self.is_configured() {
            return Err(TransportError::NotConfigured);
        }

        let url = format!("{}/bot{}/{}", self.api_url, self.token.expose_secret(), method);
        let response = self.client.post(&url).json(&payload).send().await?;
        let status = response.status();
        let body: ApiResponse<T> = response.json().await?;

        match body {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => {
                debug!(method, "Telegram call succeeded");
                Ok(result)
            }
            ApiResponse { description, .. } => Err(TransportError::Rejected {
                status: status.as_u16(),
                description: description.unwrap_or_else(|| "no description".to_string()),
            }),
        }
    }
}

/// Inline keyboard markup for a set of control rows
fn reply_markup(controls: &[Vec<Control>]) -> serde_json::Value {
    let rows: Vec<Vec<serde_json::Value>> = controls
        .iter()
        .map(|row| {
            row.iter()
                .map(|c| json!({ "text": c.label, "callback_data": c.action.encode() }))
                .collect()
        })
        .collect();
    json!({ "inline_keyboard": rows })
}

#[async_trait]
impl NotificationTransport for TelegramTransport {
    async fn send(
        &self,
        chat_id: i64,
        notification: &Notification,
    ) -> Result<MessageRef, TransportError> {
        let mut payload = json!({
            "chat_id": chat_id,
            "text": notification.text,
            "parse_mode": PARSE_MODE,
        });
        if !notification.controls.is_empty() {
            payload["reply_markup"] = reply_markup(&notification.controls);
        }

        let message: Message = self.call("sendMessage", payload).await?;
        Ok(MessageRef {
            chat_id: message.chat.id,
            message_id: message.message_id,
        })
    }

    async fn edit(
        &self,
        message: MessageRef,
        notification: &Notification,
    ) -> Result<(), TransportError> {
        let payload = json!({
            "chat_id": message.chat_id,
            "message_id": message.message_id,
            "text": notification.text,
            "parse_mode": PARSE_MODE,
            "reply_markup": reply_markup(&notification.controls),
        });
        // editMessageText returns the edited message, or `true` for inline messages
        let _: serde_json::Value = self.call("editMessageText", payload).await?;
        Ok(())
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<(), TransportError> {
        let mut payload = json!({ "callback_query_id": callback_id });
        if let Some(text) = text {
            payload["text"] = json!(text);
        }
        let _: bool = self.call("answerCallbackQuery", payload).await?;
        Ok(())
    }
}

// ============================================================================
// Bot API payloads
// ============================================================================

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

/// Incoming webhook update; only callback queries are acted on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InlineKeyboardMarkup {
    #[serde(default)]
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    #[serde(default)]
    pub callback_data: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
}

impl Message {
    pub fn message_ref(&self) -> MessageRef {
        MessageRef {
            chat_id: self.chat.id,
            message_id: self.message_id,
        }
    }

    /// The message as currently displayed, with its controls decoded
    ///
    /// Buttons whose payload does not decode are dropped.
    pub fn notification(&self) -> Notification {
        let controls = self
            .reply_markup
            .as_ref()
            .map(|markup| {
                markup
                    .inline_keyboard
                    .iter()
                    .map(|row| {
                        row.iter()
                            .filter_map(|button| {
                                let action = button.callback_data.as_deref()?.parse().ok()?;
                                Some(Control::new(button.text.clone(), action))
                            })
                            .collect::<Vec<_>>()
                    })
                    .filter(|row| !row.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Notification::with_controls(self.text.clone().unwrap_or_default(), controls)
    }
}
