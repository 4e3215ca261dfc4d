//! Outbound chat transport
//!
//! Services talk to the chat platform only through [`NotificationTransport`].
//! [`TelegramTransport`] is the production implementation;
//! [`RecordingTransport`] captures traffic for tests.

use async_trait::async_trait;
use fitness_coach_shared::Notification;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

mod recording;
pub mod telegram;

pub use recording::{RecordedEdit, RecordingTransport, SentMessage};
pub use telegram::TelegramTransport;

/// Errors raised while talking to the chat platform
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Chat transport is not configured")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Chat API rejected the request ({status}): {description}")]
    Rejected { status: u16, description: String },

    #[error("Delivery timed out after {0:?}")]
    Timeout(Duration),
}

/// Handle of a delivered message, needed to edit it later
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    pub chat_id: i64,
    pub message_id: i64,
}

/// Delivers notifications to users
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    /// Send a new message with optional controls
    async fn send(
        &self,
        chat_id: i64,
        notification: &Notification,
    ) -> Result<MessageRef, TransportError>;

    /// Replace the text and controls of an earlier message
    async fn edit(
        &self,
        message: MessageRef,
        notification: &Notification,
    ) -> Result<(), TransportError>;

    /// Acknowledge a control tap, optionally with a short toast
    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<(), TransportError>;
}
