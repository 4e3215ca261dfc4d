//! Persistence boundary for activities, item completions and reminders
//!
//! Services depend on the [`ActivityStore`] trait rather than on a pool so
//! that the delivery loop and callback handling can be exercised against
//! [`MemoryStore`] in tests. [`PgStore`] is the production implementation.
//!
//! Every state change that must happen at most once is expressed as a
//! conditional write returning whether it took effect:
//! - [`ActivityStore::insert_item_completion`] returns `None` for a duplicate
//! - [`ActivityStore::mark_reminder_sent`] only moves `pending -> sent`
//! - [`ActivityStore::close_reminder`] only moves an open reminder forward

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use fitness_coach_shared::{
    Activity, ActivityContent, ActivityKind, ActivityProgress, ActivityStatus, ItemRef, ItemStatus,
    ItemCompletion, Reminder, ReminderCategory, ReminderSnapshot, ReminderStatus, UserProfile,
};
use thiserror::Error;
use uuid::Uuid;

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors raised by a store implementation
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Stored {entity} {id} could not be decoded: {message}")]
    Corrupt {
        entity: &'static str,
        id: String,
        message: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub(crate) fn corrupt(entity: &'static str, id: impl ToString, message: impl ToString) -> Self {
        StoreError::Corrupt {
            entity,
            id: id.to_string(),
            message: message.to_string(),
        }
    }
}

// ============================================================================
// Inputs
// ============================================================================

/// A freshly generated activity
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub user_id: i64,
    pub content: ActivityContent,
    pub scheduled_date: NaiveDate,
}

impl NewActivity {
    pub fn kind(&self) -> ActivityKind {
        self.content.kind()
    }
}

/// An item outcome to record
#[derive(Debug, Clone)]
pub struct NewItemCompletion {
    pub activity_kind: ActivityKind,
    pub activity_id: Uuid,
    pub item: ItemRef,
    pub item_name: String,
    pub status: ItemStatus,
    pub recorded_at: DateTime<Utc>,
}

/// A reminder to persist in `pending` state
#[derive(Debug, Clone)]
pub struct NewReminder {
    pub user_id: i64,
    pub category: ReminderCategory,
    pub scheduled_date: NaiveDate,
    pub target_time: NaiveTime,
    pub fire_time: NaiveTime,
    pub fire_at: NaiveDateTime,
    pub snapshot: ReminderSnapshot,
    pub related_id: Uuid,
    pub related_kind: ActivityKind,
}

/// Outcome of a failed delivery attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryFailure {
    /// Total attempts so far, including this one
    pub attempts: u32,
    /// Earliest time the reminder may be retried; `None` when giving up
    pub next_attempt_at: Option<NaiveDateTime>,
    /// Move the reminder to `failed`
    pub give_up: bool,
}

// ============================================================================
// Store trait
// ============================================================================

/// Durable store for users, activities, item completions and reminders
#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// Cheap round trip used by the readiness check
    async fn health_check(&self) -> Result<(), StoreError>;

    // ---- users ----

    async fn upsert_user(&self, profile: &UserProfile) -> Result<UserProfile, StoreError>;

    async fn get_user(&self, user_id: i64) -> Result<Option<UserProfile>, StoreError>;

    // ---- activities ----

    /// Persist a new activity in `scheduled` state with zero counts
    async fn insert_activity(&self, new: NewActivity) -> Result<Activity, StoreError>;

    async fn get_activity(
        &self,
        kind: ActivityKind,
        id: Uuid,
    ) -> Result<Option<Activity>, StoreError>;

    /// Most recent activities of one kind, newest first
    async fn recent_activities(
        &self,
        kind: ActivityKind,
        user_id: i64,
        limit: usize,
    ) -> Result<Vec<Activity>, StoreError>;

    /// Overwrite counts, status and completion timestamp of an activity
    ///
    /// Returns `false` when the activity does not exist.
    async fn save_activity_progress(
        &self,
        kind: ActivityKind,
        id: Uuid,
        progress: &ActivityProgress,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<bool, StoreError>;

    // ---- item completions ----

    async fn find_item_completion(
        &self,
        kind: ActivityKind,
        activity_id: Uuid,
        item: ItemRef,
    ) -> Result<Option<ItemCompletion>, StoreError>;

    /// Record an item outcome unless one already exists for the same item
    ///
    /// Returns `None` when an earlier record won. Concurrent callers for the
    /// same item see exactly one `Some`.
    async fn insert_item_completion(
        &self,
        new: NewItemCompletion,
    ) -> Result<Option<ItemCompletion>, StoreError>;

    async fn list_item_completions(
        &self,
        kind: ActivityKind,
        activity_id: Uuid,
    ) -> Result<Vec<ItemCompletion>, StoreError>;

    // ---- reminders ----

    async fn insert_reminder(&self, new: NewReminder) -> Result<Reminder, StoreError>;

    async fn get_reminder(&self, id: Uuid) -> Result<Option<Reminder>, StoreError>;

    /// Pending reminders whose fire instant and retry gate are at or before `now`
    async fn due_reminders(&self, now: NaiveDateTime) -> Result<Vec<Reminder>, StoreError>;

    /// Reminders of one user, optionally restricted to one activity date
    async fn user_reminders(
        &self,
        user_id: i64,
        date: Option<NaiveDate>,
    ) -> Result<Vec<Reminder>, StoreError>;

    /// Move a reminder from `pending` to `sent`
    async fn mark_reminder_sent(&self, id: Uuid, sent_at: DateTime<Utc>)
        -> Result<bool, StoreError>;

    /// Record a failed delivery on a still-pending reminder
    async fn record_delivery_failure(
        &self,
        id: Uuid,
        failure: DeliveryFailure,
    ) -> Result<bool, StoreError>;

    /// Move an open (`pending` or `sent`) reminder to `completed` or `skipped`
    async fn close_reminder(
        &self,
        id: Uuid,
        status: ReminderStatus,
        closed_at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;
}

/// Build the stored form of a new activity
pub(crate) fn scheduled_activity(id: Uuid, new: NewActivity, created_at: DateTime<Utc>) -> Activity {
    let total_items = new.content.item_count();
    Activity {
        id,
        user_id: new.user_id,
        content: new.content,
        status: ActivityStatus::Scheduled,
        total_items,
        completed_items: 0,
        skipped_items: 0,
        scheduled_date: new.scheduled_date,
        completed_at: None,
        created_at,
    }
}
