//! Completion callback handling
//!
//! Control taps arrive as webhook updates. The payload is decoded once into
//! a [`CallbackAction`] and dispatched by `match`. State changes commit
//! before any confirmation is attempted; confirmations are best effort and
//! their failures are only logged.

use super::progress::ProgressService;
use super::reconciler::{not_found_label, CompletionReconciler};
use super::render;
use crate::error::ServiceError;
use crate::state::AppState;
use crate::store::{ActivityStore, NewItemCompletion};
use crate::transport::telegram::{CallbackQuery, Update};
use chrono::{DateTime, Utc};
use fitness_coach_shared::{
    Action, Activity, ActivityProgress, CallbackAction, ItemRef, ItemStatus, Reminder,
    ReminderStatus,
};
use metrics::counter;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Result of an item-level complete or skip
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Recorded {
        activity: Activity,
        progress: ActivityProgress,
        item_name: String,
    },
    /// An earlier tap already decided this item; nothing was written
    AlreadyRecorded { existing: ItemStatus },
}

/// Result of a whole-activity complete or skip
#[derive(Debug, Clone, PartialEq)]
pub enum ReminderOutcome {
    Closed {
        reminder: Reminder,
        activity: Activity,
    },
    AlreadyHandled { status: ReminderStatus },
}

pub struct CallbackService;

impl CallbackService {
    /// Record a complete or skip for one exercise or meal
    pub async fn handle_item_action(
        store: &dyn ActivityStore,
        user_id: i64,
        activity_id: Uuid,
        item: ItemRef,
        action: Action,
        now: DateTime<Utc>,
    ) -> Result<ItemOutcome, ServiceError> {
        let kind = item.activity_kind();
        let activity = store
            .get_activity(kind, activity_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(not_found_label(kind)))?;
        if activity.user_id != user_id {
            return Err(ServiceError::NotOwner(not_found_label(kind)));
        }

        let item_name = activity
            .content
            .item_name(item)
            .ok_or_else(|| ServiceError::Validation(format!("No item {} in {}", item, kind)))?;

        if let Some(existing) = store.find_item_completion(kind, activity_id, item).await? {
            counter!("item_actions_total", "kind" => kind.as_str(), "outcome" => "duplicate")
                .increment(1);
            return Ok(ItemOutcome::AlreadyRecorded {
                existing: existing.status,
            });
        }

        let inserted = store
            .insert_item_completion(NewItemCompletion {
                activity_kind: kind,
                activity_id,
                item,
                item_name: item_name.clone(),
                status: action.item_status(),
                recorded_at: now,
            })
            .await?;

        if inserted.is_none() {
            // Lost a race with a concurrent tap on the same item
            let existing = store
                .find_item_completion(kind, activity_id, item)
                .await?
                .map(|c| c.status)
                .unwrap_or_else(|| action.item_status());
            counter!("item_actions_total", "kind" => kind.as_str(), "outcome" => "duplicate")
                .increment(1);
            return Ok(ItemOutcome::AlreadyRecorded { existing });
        }

        let (activity, progress) =
            CompletionReconciler::reconcile(store, kind, activity_id, now).await?;
        counter!("item_actions_total", "kind" => kind.as_str(), "outcome" => "recorded")
            .increment(1);
        info!(
            %activity_id,
            user_id,
            item = %item,
            action = action.as_str(),
            completed = progress.completed,
            skipped = progress.skipped,
            total = progress.total,
            "Recorded item action"
        );

        Ok(ItemOutcome::Recorded {
            activity,
            progress,
            item_name,
        })
    }

    /// Complete or skip the whole activity behind a reminder
    pub async fn handle_reminder_action(
        store: &dyn ActivityStore,
        user_id: i64,
        reminder_id: Uuid,
        action: Action,
        now: DateTime<Utc>,
    ) -> Result<ReminderOutcome, ServiceError> {
        let reminder = store
            .get_reminder(reminder_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Reminder".to_string()))?;
        if reminder.user_id != user_id {
            return Err(ServiceError::NotOwner("Reminder".to_string()));
        }
        if !reminder.status.is_open() {
            return Ok(ReminderOutcome::AlreadyHandled {
                status: reminder.status,
            });
        }

        let kind = reminder.related_kind;
        let activity = store
            .get_activity(kind, reminder.related_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(not_found_label(kind)))?;

        // Only the tap that closes the reminder may write the activity
        let next = action.reminder_status();
        if !store.close_reminder(reminder_id, next, now).await? {
            let status = store
                .get_reminder(reminder_id)
                .await?
                .map(|r| r.status)
                .unwrap_or(next);
            return Ok(ReminderOutcome::AlreadyHandled { status });
        }

        let progress = ActivityProgress {
            status: action.activity_status(),
            ..activity.progress()
        };
        let completed_at = activity.completed_at.or(Some(now));
        if !store
            .save_activity_progress(kind, activity.id, &progress, completed_at)
            .await?
        {
            return Err(ServiceError::NotFound(not_found_label(kind)));
        }

        counter!("reminder_actions_total", "action" => action.as_str()).increment(1);
        info!(
            %reminder_id,
            user_id,
            activity_id = %activity.id,
            action = action.as_str(),
            "Closed reminder"
        );

        let activity = Activity {
            status: progress.status,
            completed_at,
            ..activity
        };
        let reminder = Reminder {
            status: next,
            completed_at: Some(now),
            ..reminder
        };
        Ok(ReminderOutcome::Closed { reminder, activity })
    }

    /// Entry point for webhook updates
    ///
    /// Never fails: every problem is reported to the user as a toast and
    /// logged.
    pub async fn handle_update(state: &AppState, update: Update) {
        let Some(query) = update.callback_query else {
            debug!(update_id = update.update_id, "Ignoring update without callback");
            return;
        };

        let action = match query.data.as_deref().map(str::parse::<CallbackAction>) {
            Some(Ok(action)) => action,
            Some(Err(e)) => {
                warn!(user_id = query.from.id, error = %e, "Undecodable callback payload");
                answer(state, &query, Some("❌ Invalid request.")).await;
                return;
            }
            None => {
                answer(state, &query, None).await;
                return;
            }
        };

        match action {
            CallbackAction::Item {
                activity_id,
                item,
                action,
            } => Self::on_item(state, &query, activity_id, item, action).await,
            CallbackAction::Reminder {
                reminder_id,
                action,
            } => Self::on_reminder(state, &query, reminder_id, action).await,
            CallbackAction::ShowProgress => Self::on_show_progress(state, &query).await,
        }
    }

    async fn on_item(
        state: &AppState,
        query: &CallbackQuery,
        activity_id: Uuid,
        item: ItemRef,
        action: Action,
    ) {
        let result = Self::handle_item_action(
            state.store(),
            query.from.id,
            activity_id,
            item,
            action,
            state.clock.utc_now(),
        )
        .await;

        match result {
            Ok(ItemOutcome::Recorded {
                activity, progress, ..
            }) => {
                answer(state, query, None).await;
                if let Some(message) = &query.message {
                    let edited = render::item_progress(
                        &message.notification(),
                        &activity,
                        item,
                        action.item_status(),
                        &progress,
                    );
                    if let Err(e) = state.transport.edit(message.message_ref(), &edited).await {
                        warn!(%activity_id, error = %e, "Could not update reminder message");
                    }
                }
            }
            Ok(ItemOutcome::AlreadyRecorded { existing }) => {
                answer(state, query, Some(render::already_recorded(item, existing).as_str())).await;
            }
            Err(ServiceError::NotFound(what) | ServiceError::NotOwner(what)) => {
                counter!("item_actions_total", "kind" => item.activity_kind().as_str(), "outcome" => "not_found")
                    .increment(1);
                answer(state, query, Some(render::not_found(&what).as_str())).await;
            }
            Err(e) => {
                error!(%activity_id, user_id = query.from.id, error = %e, "Item action failed");
                answer(state, query, Some("❌ Something went wrong. Please try again.")).await;
            }
        }
    }

    async fn on_reminder(state: &AppState, query: &CallbackQuery, reminder_id: Uuid, action: Action) {
        let result = Self::handle_reminder_action(
            state.store(),
            query.from.id,
            reminder_id,
            action,
            state.clock.utc_now(),
        )
        .await;

        match result {
            Ok(ReminderOutcome::Closed { reminder, activity }) => {
                answer(state, query, None).await;
                let confirmation = render::reminder_confirmation(&reminder, &activity, action);
                if let Err(e) = state.transport.send(chat_id(query), &confirmation).await {
                    warn!(%reminder_id, error = %e, "Could not send confirmation");
                }
            }
            Ok(ReminderOutcome::AlreadyHandled { status }) => {
                let toast = format!("⚠️ This reminder was already {}.", status);
                answer(state, query, Some(toast.as_str())).await;
            }
            Err(ServiceError::NotFound(what) | ServiceError::NotOwner(what)) => {
                answer(state, query, Some(render::not_found(&what).as_str())).await;
            }
            Err(e) => {
                error!(%reminder_id, user_id = query.from.id, error = %e, "Reminder action failed");
                answer(state, query, Some("❌ Something went wrong. Please try again.")).await;
            }
        }
    }

    async fn on_show_progress(state: &AppState, query: &CallbackQuery) {
        answer(state, query, None).await;
        match ProgressService::user_progress(state.store(), query.from.id).await {
            Ok(report) => {
                let text = render::progress_report(&report);
                if let Err(e) = state.transport.send(chat_id(query), &text).await {
                    warn!(user_id = query.from.id, error = %e, "Could not send progress report");
                }
            }
            Err(e) => error!(user_id = query.from.id, error = %e, "Could not build progress report"),
        }
    }
}

/// Private chats share the user's id; prefer the chat the tap came from
fn chat_id(query: &CallbackQuery) -> i64 {
    query
        .message
        .as_ref()
        .map(|m| m.chat.id)
        .unwrap_or(query.from.id)
}

async fn answer(state: &AppState, query: &CallbackQuery, text: Option<&str>) {
    if let Err(e) = state.transport.answer_callback(&query.id, text).await {
        debug!(callback_id = %query.id, error = %e, "Could not answer callback");
    }
}
