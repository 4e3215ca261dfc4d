//! In-process store used by tests and local runs without a database

use super::{
    scheduled_activity, ActivityStore, DeliveryFailure, NewActivity, NewItemCompletion,
    NewReminder, StoreError,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use fitness_coach_shared::{
    Activity, ActivityKind, ActivityProgress, ItemCompletion, ItemRef, Reminder, ReminderStatus,
    UserProfile,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: HashMap<i64, UserProfile>,
    /// Insertion order doubles as recency order
    activities: Vec<Activity>,
    completions: Vec<ItemCompletion>,
    reminders: HashMap<Uuid, Reminder>,
}

/// [`ActivityStore`] backed by a mutex-guarded set of tables
///
/// Uniqueness of item completions and the conditional reminder transitions
/// are enforced under the lock, so concurrent callers observe the same
/// at-most-once behavior as the Postgres store.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with [`StoreError::Unavailable`]
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store switched off".to_string()));
        }
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

fn find_activity<'a>(
    tables: &'a mut Tables,
    kind: ActivityKind,
    id: Uuid,
) -> Option<&'a mut Activity> {
    tables
        .activities
        .iter_mut()
        .find(|a| a.id == id && a.kind() == kind)
}

#[async_trait]
impl ActivityStore for MemoryStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        self.tables().map(|_| ())
    }

    async fn upsert_user(&self, profile: &UserProfile) -> Result<UserProfile, StoreError> {
        let mut tables = self.tables()?;
        tables.users.insert(profile.user_id, profile.clone());
        Ok(profile.clone())
    }

    async fn get_user(&self, user_id: i64) -> Result<Option<UserProfile>, StoreError> {
        Ok(self.tables()?.users.get(&user_id).cloned())
    }

    async fn insert_activity(&self, new: NewActivity) -> Result<Activity, StoreError> {
        let activity = scheduled_activity(Uuid::new_v4(), new, Utc::now());
        self.tables()?.activities.push(activity.clone());
        Ok(activity)
    }

    async fn get_activity(
        &self,
        kind: ActivityKind,
        id: Uuid,
    ) -> Result<Option<Activity>, StoreError> {
        let mut tables = self.tables()?;
        Ok(find_activity(&mut tables, kind, id).map(|a| a.clone()))
    }

    async fn recent_activities(
        &self,
        kind: ActivityKind,
        user_id: i64,
        limit: usize,
    ) -> Result<Vec<Activity>, StoreError> {
        let tables = self.tables()?;
        Ok(tables
            .activities
            .iter()
            .rev()
            .filter(|a| a.user_id == user_id && a.kind() == kind)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn save_activity_progress(
        &self,
        kind: ActivityKind,
        id: Uuid,
        progress: &ActivityProgress,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables()?;
        let Some(activity) = find_activity(&mut tables, kind, id) else {
            return Ok(false);
        };
        activity.total_items = progress.total;
        activity.completed_items = progress.completed;
        activity.skipped_items = progress.skipped;
        activity.status = progress.status;
        activity.completed_at = completed_at;
        Ok(true)
    }

    async fn find_item_completion(
        &self,
        kind: ActivityKind,
        activity_id: Uuid,
        item: ItemRef,
    ) -> Result<Option<ItemCompletion>, StoreError> {
        let tables = self.tables()?;
        Ok(tables
            .completions
            .iter()
            .find(|c| c.activity_kind == kind && c.activity_id == activity_id && c.item == item)
            .cloned())
    }

    async fn insert_item_completion(
        &self,
        new: NewItemCompletion,
    ) -> Result<Option<ItemCompletion>, StoreError> {
        let mut tables = self.tables()?;
        let duplicate = tables.completions.iter().any(|c| {
            c.activity_kind == new.activity_kind
                && c.activity_id == new.activity_id
                && c.item == new.item
        });
        if duplicate {
            return Ok(None);
        }

        let completion = ItemCompletion {
            id: Uuid::new_v4(),
            activity_kind: new.activity_kind,
            activity_id: new.activity_id,
            item: new.item,
            item_name: new.item_name,
            status: new.status,
            recorded_at: new.recorded_at,
        };
        tables.completions.push(completion.clone());
        Ok(Some(completion))
    }

    async fn list_item_completions(
        &self,
        kind: ActivityKind,
        activity_id: Uuid,
    ) -> Result<Vec<ItemCompletion>, StoreError> {
        let tables = self.tables()?;
        Ok(tables
            .completions
            .iter()
            .filter(|c| c.activity_kind == kind && c.activity_id == activity_id)
            .cloned()
            .collect())
    }

    async fn insert_reminder(&self, new: NewReminder) -> Result<Reminder, StoreError> {
        let reminder = Reminder {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            category: new.category,
            scheduled_date: new.scheduled_date,
            target_time: new.target_time,
            fire_time: new.fire_time,
            fire_at: new.fire_at,
            snapshot: new.snapshot,
            related_id: new.related_id,
            related_kind: new.related_kind,
            status: ReminderStatus::Pending,
            attempts: 0,
            next_attempt_at: None,
            created_at: Utc::now(),
            sent_at: None,
            completed_at: None,
        };
        self.tables()?.reminders.insert(reminder.id, reminder.clone());
        Ok(reminder)
    }

    async fn get_reminder(&self, id: Uuid) -> Result<Option<Reminder>, StoreError> {
        Ok(self.tables()?.reminders.get(&id).cloned())
    }

    async fn due_reminders(&self, now: NaiveDateTime) -> Result<Vec<Reminder>, StoreError> {
        let tables = self.tables()?;
        let mut due: Vec<Reminder> = tables
            .reminders
            .values()
            .filter(|r| {
                r.status == ReminderStatus::Pending
                    && r.fire_at <= now
                    && r.next_attempt_at.map_or(true, |at| at <= now)
            })
            .cloned()
            .collect();
        due.sort_by_key(|r| (r.fire_at, r.created_at));
        Ok(due)
    }

    async fn user_reminders(
        &self,
        user_id: i64,
        date: Option<NaiveDate>,
    ) -> Result<Vec<Reminder>, StoreError> {
        let tables = self.tables()?;
        let mut reminders: Vec<Reminder> = tables
            .reminders
            .values()
            .filter(|r| r.user_id == user_id && date.map_or(true, |d| r.scheduled_date == d))
            .cloned()
            .collect();
        reminders.sort_by_key(|r| (r.fire_at, r.created_at));
        Ok(reminders)
    }

    async fn mark_reminder_sent(
        &self,
        id: Uuid,
        sent_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables()?;
        match tables.reminders.get_mut(&id) {
            Some(r) if r.status == ReminderStatus::Pending => {
                r.status = ReminderStatus::Sent;
                r.attempts += 1;
                r.sent_at = Some(sent_at);
                r.next_attempt_at = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn record_delivery_failure(
        &self,
        id: Uuid,
        failure: DeliveryFailure,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables()?;
        match tables.reminders.get_mut(&id) {
            Some(r) if r.status == ReminderStatus::Pending => {
                r.attempts = failure.attempts;
                r.next_attempt_at = failure.next_attempt_at;
                if failure.give_up {
                    r.status = ReminderStatus::Failed;
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn close_reminder(
        &self,
        id: Uuid,
        status: ReminderStatus,
        closed_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables()?;
        match tables.reminders.get_mut(&id) {
            Some(r) if r.status.is_open() && r.status.can_transition_to(status) => {
                r.status = status;
                r.completed_at = Some(closed_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
