//! In-memory transport capturing every call

use super::{MessageRef, NotificationTransport, TransportError};
use async_trait::async_trait;
use fitness_coach_shared::Notification;
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub message: MessageRef,
    pub notification: Notification,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEdit {
    pub message: MessageRef,
    pub notification: Notification,
}

/// [`NotificationTransport`] that records traffic and can simulate outages
///
/// `fail_next(n)` makes the next `n` sends fail; `set_delay` stalls every
/// send, which lets tests drive the dispatcher's timeout.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<SentMessage>>,
    edits: Mutex<Vec<RecordedEdit>>,
    answers: Mutex<Vec<(String, Option<String>)>>,
    failures_left: AtomicU32,
    next_message_id: AtomicI64,
    delay: Mutex<Option<Duration>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self, sends: u32) {
        self.failures_left.store(sends, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        if let Ok(mut guard) = self.delay.lock() {
            *guard = delay;
        }
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().map(|g| g.clone()).unwrap_or_default()
    }

    pub fn edits(&self) -> Vec<RecordedEdit> {
        self.edits.lock().map(|g| g.clone()).unwrap_or_default()
    }

    pub fn answers(&self) -> Vec<(String, Option<String>)> {
        self.answers.lock().map(|g| g.clone()).unwrap_or_default()
    }

    fn take_failure(&self) -> bool {
        self.failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl NotificationTransport for RecordingTransport {
    async fn send(
        &self,
        chat_id: i64,
        notification: &Notification,
    ) -> Result<MessageRef, TransportError> {
        let delay = self.delay.lock().ok().and_then(|g| *g);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.take_failure() {
            return Err(TransportError::Rejected {
                status: 502,
                description: "simulated outage".to_string(),
            });
        }

        let message = MessageRef {
            chat_id,
            message_id: self.next_message_id.fetch_add(1, Ordering::SeqCst) + 1,
        };
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(SentMessage {
                message,
                notification: notification.clone(),
            });
        }
        Ok(message)
    }

    async fn edit(
        &self,
        message: MessageRef,
        notification: &Notification,
    ) -> Result<(), TransportError> {
        if let Ok(mut edits) = self.edits.lock() {
            edits.push(RecordedEdit {
                message,
                notification: notification.clone(),
            });
        }
        Ok(())
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<(), TransportError> {
        if let Ok(mut answers) = self.answers.lock() {
            answers.push((callback_id.to_string(), text.map(str::to_string)));
        }
        Ok(())
    }
}
