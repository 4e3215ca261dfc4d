//! Reminder delivery loop
//!
//! A single background task polls for due reminders at a fixed cadence,
//! renders and sends each one, then flips it from `pending` to `sent`.
//! A failed send leaves the reminder pending behind a backoff gate; after
//! `max_attempts` failures it becomes `failed`.
//!
//! A tick never outlives the poll interval: each send is bounded by the
//! smaller of `send_timeout` and the time left in the tick, and reminders
//! not reached before the deadline stay pending for the next tick.
//!
//! Shutdown is observed between ticks only, so an in-flight tick always
//! runs to completion.

use super::render;
use crate::clock::Clock;
use crate::config::ReminderConfig;
use crate::error::ServiceError;
use crate::state::AppState;
use crate::store::{ActivityStore, DeliveryFailure};
use crate::transport::{NotificationTransport, TransportError};
use chrono::Duration as ChronoDuration;
use fitness_coach_shared::Reminder;
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// What one tick did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub due: usize,
    pub sent: usize,
    pub failed: usize,
    /// Reminders moved to `failed` during this tick
    pub gave_up: usize,
    /// Due reminders left untouched because the tick ran out of time
    pub deferred: usize,
}

enum Delivery {
    Sent,
    Failed { gave_up: bool },
}

pub struct ReminderDispatcher {
    store: Arc<dyn ActivityStore>,
    transport: Arc<dyn NotificationTransport>,
    clock: Arc<dyn Clock>,
    config: ReminderConfig,
}

impl ReminderDispatcher {
    pub fn new(
        store: Arc<dyn ActivityStore>,
        transport: Arc<dyn NotificationTransport>,
        clock: Arc<dyn Clock>,
        config: ReminderConfig,
    ) -> Self {
        Self {
            store,
            transport,
            clock,
            config,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            state.store.clone(),
            state.transport.clone(),
            state.clock.clone(),
            state.config.reminders.clone(),
        )
    }

    /// Deliver every reminder due now
    ///
    /// Only the due query can fail the tick; a failure on one reminder is
    /// recorded on that reminder and the tick moves on.
    pub async fn tick(&self) -> Result<TickReport, ServiceError> {
        let deadline = Instant::now() + self.config.poll_interval();
        let now = self.clock.local_now();
        let due = self.store.due_reminders(now).await?;
        let mut report = TickReport {
            due: due.len(),
            ..Default::default()
        };

        for (index, reminder) in due.iter().enumerate() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                report.deferred = due.len() - index;
                warn!(deferred = report.deferred, "Tick deadline reached, deferring reminders");
                break;
            }
            match self.deliver(reminder, remaining).await {
                Delivery::Sent => report.sent += 1,
                Delivery::Failed { gave_up } => {
                    report.failed += 1;
                    if gave_up {
                        report.gave_up += 1;
                    }
                }
            }
        }

        Ok(report)
    }

    async fn deliver(&self, reminder: &Reminder, remaining: Duration) -> Delivery {
        let activity = match self
            .store
            .get_activity(reminder.related_kind, reminder.related_id)
            .await
        {
            Ok(activity) => activity,
            Err(e) => {
                warn!(reminder_id = %reminder.id, error = %e, "Could not load related activity");
                None
            }
        };
        if activity.is_none() {
            debug!(
                reminder_id = %reminder.id,
                related_id = %reminder.related_id,
                "Sending reminder without item controls"
            );
        }

        let notification = render::reminder_notification(reminder, activity.as_ref());
        let timeout = self.config.send_timeout().min(remaining);
        let sent = match tokio::time::timeout(
            timeout,
            self.transport.send(reminder.user_id, &notification),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(timeout)),
        };

        match sent {
            Ok(message) => {
                counter!("reminders_sent_total", "category" => reminder.category.as_str())
                    .increment(1);
                match self
                    .store
                    .mark_reminder_sent(reminder.id, self.clock.utc_now())
                    .await
                {
                    Ok(true) => info!(
                        reminder_id = %reminder.id,
                        user_id = reminder.user_id,
                        message_id = message.message_id,
                        category = %reminder.category,
                        "Sent reminder"
                    ),
                    Ok(false) => warn!(
                        reminder_id = %reminder.id,
                        "Reminder sent but was no longer pending"
                    ),
                    // The message is out; the next tick may send it again
                    Err(e) => error!(
                        reminder_id = %reminder.id,
                        error = %e,
                        "Reminder sent but could not be marked as sent"
                    ),
                }
                Delivery::Sent
            }
            Err(e) => {
                counter!(
                    "reminder_delivery_failures_total",
                    "category" => reminder.category.as_str()
                )
                .increment(1);
                let gave_up = self.record_failure(reminder, &e).await;
                Delivery::Failed { gave_up }
            }
        }
    }

    /// Push the retry gate forward, or give up after the last attempt
    async fn record_failure(&self, reminder: &Reminder, cause: &TransportError) -> bool {
        let attempts = reminder.attempts.saturating_add(1);
        let give_up = attempts >= self.config.max_attempts;
        let next_attempt_at = if give_up {
            None
        } else {
            ChronoDuration::from_std(self.config.retry_delay(attempts))
                .ok()
                .map(|delay| self.clock.local_now() + delay)
        };

        if give_up {
            error!(
                reminder_id = %reminder.id,
                user_id = reminder.user_id,
                attempts,
                error = %cause,
                "Giving up on reminder"
            );
        } else {
            warn!(
                reminder_id = %reminder.id,
                user_id = reminder.user_id,
                attempts,
                next_attempt_at = ?next_attempt_at,
                error = %cause,
                "Reminder delivery failed"
            );
        }

        let failure = DeliveryFailure {
            attempts,
            next_attempt_at,
            give_up,
        };
        match self.store.record_delivery_failure(reminder.id, failure).await {
            Ok(recorded) => give_up && recorded,
            Err(e) => {
                error!(reminder_id = %reminder.id, error = %e, "Could not record delivery failure");
                false
            }
        }
    }

    /// Tick at the configured cadence until `shutdown` turns true
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.config.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            poll_interval_secs = self.config.poll_interval().as_secs(),
            "Reminder dispatcher started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            }

            if *shutdown.borrow() {
                break;
            }

            match self.tick().await {
                Ok(report) if report.due > 0 => info!(
                    due = report.due,
                    sent = report.sent,
                    failed = report.failed,
                    gave_up = report.gave_up,
                    deferred = report.deferred,
                    "Reminder tick finished"
                ),
                Ok(_) => {}
                Err(e) => error!(error = %e, "Reminder tick failed"),
            }
        }

        info!("Reminder dispatcher stopped");
    }

    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
