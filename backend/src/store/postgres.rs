//! PostgreSQL-backed store
//!
//! Workouts and diet plans live in separate tables with their own
//! completion tables; this module dispatches on [`ActivityKind`] and maps
//! records to domain types.

use super::{
    ActivityStore, DeliveryFailure, NewActivity, NewItemCompletion, NewReminder, StoreError,
};
use crate::db;
use crate::repositories::{
    CreateDietCompletion, CreateDietPlan, CreateExerciseCompletion, CreateReminder,
    CreateWorkout, DietCompletionRecord, DietCompletionRepository, DietPlanRecord,
    DietPlanRepository, DietProgressUpdate, ExerciseCompletionRecord,
    ExerciseCompletionRepository, ReminderRecord, ReminderRepository, UpsertUser, UserRecord,
    UserRepository, WorkoutProgressUpdate, WorkoutRecord, WorkoutRepository,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use fitness_coach_shared::{
    Activity, ActivityContent, ActivityKind, ActivityProgress, ActivityStatus, DietContent,
    ItemCompletion, ItemRef, ItemStatus, MealSlot, Reminder, ReminderCategory, ReminderSnapshot,
    ReminderStatus, UserProfile, WorkoutContent,
};
use sqlx::PgPool;
use uuid::Uuid;

/// [`ActivityStore`] over a Postgres pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn to_u32(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

// ============================================================================
// Record conversions
// ============================================================================

fn record_to_user(record: UserRecord) -> UserProfile {
    UserProfile {
        user_id: record.user_id,
        first_name: record.first_name,
        age: record.age,
        height_cm: record.height_cm,
        weight_kg: record.weight_kg,
        fitness_level: record.fitness_level,
        goals: record.goals,
        workout_time: record.workout_time,
        breakfast_time: record.breakfast_time,
        lunch_time: record.lunch_time,
        dinner_time: record.dinner_time,
        snack_time: record.snack_time,
    }
}

fn record_to_workout(record: WorkoutRecord) -> Result<Activity, StoreError> {
    let content: WorkoutContent = serde_json::from_value(record.workout_content)
        .map_err(|e| StoreError::corrupt("workout", record.id, e))?;
    let status = record
        .status
        .parse::<ActivityStatus>()
        .map_err(|e| StoreError::corrupt("workout", record.id, e))?;

    Ok(Activity {
        id: record.id,
        user_id: record.user_id,
        content: ActivityContent::Workout(content),
        status,
        total_items: to_u32(record.total_exercises),
        completed_items: to_u32(record.exercises_completed),
        skipped_items: to_u32(record.exercises_skipped),
        scheduled_date: record.scheduled_date,
        completed_at: record.completion_date,
        created_at: record.created_at,
    })
}

fn record_to_diet(record: DietPlanRecord) -> Result<Activity, StoreError> {
    let content: DietContent = serde_json::from_value(record.diet_content)
        .map_err(|e| StoreError::corrupt("diet plan", record.id, e))?;
    let status = record
        .status
        .parse::<ActivityStatus>()
        .map_err(|e| StoreError::corrupt("diet plan", record.id, e))?;

    Ok(Activity {
        id: record.id,
        user_id: record.user_id,
        content: ActivityContent::Diet(content),
        status,
        total_items: to_u32(record.total_meals),
        completed_items: to_u32(record.meals_completed),
        skipped_items: to_u32(record.meals_skipped),
        scheduled_date: record.scheduled_date,
        completed_at: record.completion_date,
        created_at: record.created_at,
    })
}

fn record_to_exercise_completion(
    record: ExerciseCompletionRecord,
) -> Result<ItemCompletion, StoreError> {
    let status = record
        .status
        .parse::<ItemStatus>()
        .map_err(|e| StoreError::corrupt("exercise completion", record.id, e))?;

    Ok(ItemCompletion {
        id: record.id,
        activity_kind: ActivityKind::Workout,
        activity_id: record.workout_id,
        item: ItemRef::Exercise(to_u32(record.exercise_index)),
        item_name: record.exercise_name,
        status,
        recorded_at: record.completed_at,
    })
}

fn record_to_diet_completion(record: DietCompletionRecord) -> Result<ItemCompletion, StoreError> {
    let slot = record
        .meal_type
        .parse::<MealSlot>()
        .map_err(|e| StoreError::corrupt("diet completion", record.id, e))?;
    let status = record
        .status
        .parse::<ItemStatus>()
        .map_err(|e| StoreError::corrupt("diet completion", record.id, e))?;

    Ok(ItemCompletion {
        id: record.id,
        activity_kind: ActivityKind::Diet,
        activity_id: record.diet_plan_id,
        item: ItemRef::Meal(slot),
        item_name: record.meal_name,
        status,
        recorded_at: record.completed_at,
    })
}

fn record_to_reminder(record: ReminderRecord) -> Result<Reminder, StoreError> {
    let id = record.id;
    let corrupt = |e: &dyn std::fmt::Display| StoreError::corrupt("reminder", id, e);

    Ok(Reminder {
        id,
        user_id: record.user_id,
        category: record.reminder_type.parse::<ReminderCategory>().map_err(|e| corrupt(&e))?,
        scheduled_date: record.scheduled_date,
        target_time: record.scheduled_time,
        fire_time: record.reminder_time,
        fire_at: record.fire_at,
        snapshot: serde_json::from_value::<ReminderSnapshot>(record.content).map_err(|e| corrupt(&e))?,
        related_id: record.related_id,
        related_kind: record.related_type.parse::<ActivityKind>().map_err(|e| corrupt(&e))?,
        status: record.status.parse::<ReminderStatus>().map_err(|e| corrupt(&e))?,
        attempts: to_u32(record.attempts),
        next_attempt_at: record.next_attempt_at,
        created_at: record.created_at,
        sent_at: record.sent_at,
        completed_at: record.completed_at,
    })
}

fn collect<R, T>(
    records: Vec<R>,
    convert: fn(R) -> Result<T, StoreError>,
) -> Result<Vec<T>, StoreError> {
    records.into_iter().map(convert).collect()
}

// ============================================================================
// Store implementation
// ============================================================================

#[async_trait]
impl ActivityStore for PgStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        db::health_check(&self.pool).await?;
        Ok(())
    }

    async fn upsert_user(&self, profile: &UserProfile) -> Result<UserProfile, StoreError> {
        let input = UpsertUser {
            user_id: profile.user_id,
            first_name: profile.first_name.clone(),
            age: profile.age,
            height_cm: profile.height_cm,
            weight_kg: profile.weight_kg,
            fitness_level: profile.fitness_level.clone(),
            goals: profile.goals.clone(),
            workout_time: profile.workout_time,
            breakfast_time: profile.breakfast_time,
            lunch_time: profile.lunch_time,
            dinner_time: profile.dinner_time,
            snack_time: profile.snack_time,
        };
        let record = UserRepository::upsert(&self.pool, input).await?;
        Ok(record_to_user(record))
    }

    async fn get_user(&self, user_id: i64) -> Result<Option<UserProfile>, StoreError> {
        let record = UserRepository::find_by_id(&self.pool, user_id).await?;
        Ok(record.map(record_to_user))
    }

    async fn insert_activity(&self, new: NewActivity) -> Result<Activity, StoreError> {
        let id = Uuid::new_v4();
        let total = to_i32(new.content.item_count());

        match new.content {
            ActivityContent::Workout(content) => {
                let record = WorkoutRepository::create(
                    &self.pool,
                    CreateWorkout {
                        id,
                        user_id: new.user_id,
                        workout_content: serde_json::to_value(&content)?,
                        total_exercises: total,
                        scheduled_date: new.scheduled_date,
                    },
                )
                .await?;
                record_to_workout(record)
            }
            ActivityContent::Diet(content) => {
                let record = DietPlanRepository::create(
                    &self.pool,
                    CreateDietPlan {
                        id,
                        user_id: new.user_id,
                        diet_content: serde_json::to_value(&content)?,
                        total_meals: total,
                        scheduled_date: new.scheduled_date,
                    },
                )
                .await?;
                record_to_diet(record)
            }
        }
    }

    async fn get_activity(
        &self,
        kind: ActivityKind,
        id: Uuid,
    ) -> Result<Option<Activity>, StoreError> {
        match kind {
            ActivityKind::Workout => WorkoutRepository::get_by_id(&self.pool, id)
                .await?
                .map(record_to_workout)
                .transpose(),
            ActivityKind::Diet => DietPlanRepository::get_by_id(&self.pool, id)
                .await?
                .map(record_to_diet)
                .transpose(),
        }
    }

    async fn recent_activities(
        &self,
        kind: ActivityKind,
        user_id: i64,
        limit: usize,
    ) -> Result<Vec<Activity>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        match kind {
            ActivityKind::Workout => collect(
                WorkoutRepository::get_recent(&self.pool, user_id, limit).await?,
                record_to_workout,
            ),
            ActivityKind::Diet => collect(
                DietPlanRepository::get_recent(&self.pool, user_id, limit).await?,
                record_to_diet,
            ),
        }
    }

    async fn save_activity_progress(
        &self,
        kind: ActivityKind,
        id: Uuid,
        progress: &ActivityProgress,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<bool, StoreError> {
        let updated = match kind {
            ActivityKind::Workout => {
                WorkoutRepository::update_progress(
                    &self.pool,
                    id,
                    WorkoutProgressUpdate {
                        total_exercises: to_i32(progress.total),
                        exercises_completed: to_i32(progress.completed),
                        exercises_skipped: to_i32(progress.skipped),
                        status: progress.status.to_string(),
                        completion_date: completed_at,
                    },
                )
                .await?
            }
            ActivityKind::Diet => {
                DietPlanRepository::update_progress(
                    &self.pool,
                    id,
                    DietProgressUpdate {
                        total_meals: to_i32(progress.total),
                        meals_completed: to_i32(progress.completed),
                        meals_skipped: to_i32(progress.skipped),
                        status: progress.status.to_string(),
                        completion_date: completed_at,
                    },
                )
                .await?
            }
        };
        Ok(updated)
    }

    async fn find_item_completion(
        &self,
        kind: ActivityKind,
        activity_id: Uuid,
        item: ItemRef,
    ) -> Result<Option<ItemCompletion>, StoreError> {
        match (kind, item) {
            (ActivityKind::Workout, ItemRef::Exercise(index)) => {
                ExerciseCompletionRepository::find(&self.pool, activity_id, to_i32(index))
                    .await?
                    .map(record_to_exercise_completion)
                    .transpose()
            }
            (ActivityKind::Diet, ItemRef::Meal(slot)) => {
                DietCompletionRepository::find(&self.pool, activity_id, slot.as_str())
                    .await?
                    .map(record_to_diet_completion)
                    .transpose()
            }
            _ => Ok(None),
        }
    }

    async fn insert_item_completion(
        &self,
        new: NewItemCompletion,
    ) -> Result<Option<ItemCompletion>, StoreError> {
        match (new.activity_kind, new.item) {
            (ActivityKind::Workout, ItemRef::Exercise(index)) => {
                ExerciseCompletionRepository::insert_if_absent(
                    &self.pool,
                    CreateExerciseCompletion {
                        workout_id: new.activity_id,
                        exercise_index: to_i32(index),
                        exercise_name: new.item_name,
                        status: new.status.to_string(),
                        completed_at: new.recorded_at,
                    },
                )
                .await?
                .map(record_to_exercise_completion)
                .transpose()
            }
            (ActivityKind::Diet, ItemRef::Meal(slot)) => {
                DietCompletionRepository::insert_if_absent(
                    &self.pool,
                    CreateDietCompletion {
                        diet_plan_id: new.activity_id,
                        meal_type: slot.to_string(),
                        meal_name: new.item_name,
                        status: new.status.to_string(),
                        completed_at: new.recorded_at,
                    },
                )
                .await?
                .map(record_to_diet_completion)
                .transpose()
            }
            (kind, item) => Err(StoreError::corrupt(
                "item completion",
                new.activity_id,
                format!("item {} does not belong to a {}", item, kind),
            )),
        }
    }

    async fn list_item_completions(
        &self,
        kind: ActivityKind,
        activity_id: Uuid,
    ) -> Result<Vec<ItemCompletion>, StoreError> {
        match kind {
            ActivityKind::Workout => collect(
                ExerciseCompletionRepository::list_for_workout(&self.pool, activity_id).await?,
                record_to_exercise_completion,
            ),
            ActivityKind::Diet => collect(
                DietCompletionRepository::list_for_plan(&self.pool, activity_id).await?,
                record_to_diet_completion,
            ),
        }
    }

    async fn insert_reminder(&self, new: NewReminder) -> Result<Reminder, StoreError> {
        let record = ReminderRepository::create(
            &self.pool,
            CreateReminder {
                id: Uuid::new_v4(),
                user_id: new.user_id,
                reminder_type: new.category.to_string(),
                scheduled_date: new.scheduled_date,
                scheduled_time: new.target_time,
                reminder_time: new.fire_time,
                fire_at: new.fire_at,
                content: serde_json::to_value(&new.snapshot)?,
                related_id: new.related_id,
                related_type: new.related_kind.to_string(),
            },
        )
        .await?;
        record_to_reminder(record)
    }

    async fn get_reminder(&self, id: Uuid) -> Result<Option<Reminder>, StoreError> {
        ReminderRepository::get_by_id(&self.pool, id)
            .await?
            .map(record_to_reminder)
            .transpose()
    }

    async fn due_reminders(&self, now: NaiveDateTime) -> Result<Vec<Reminder>, StoreError> {
        collect(
            ReminderRepository::get_due(&self.pool, now).await?,
            record_to_reminder,
        )
    }

    async fn user_reminders(
        &self,
        user_id: i64,
        date: Option<NaiveDate>,
    ) -> Result<Vec<Reminder>, StoreError> {
        collect(
            ReminderRepository::get_for_user(&self.pool, user_id, date).await?,
            record_to_reminder,
        )
    }

    async fn mark_reminder_sent(
        &self,
        id: Uuid,
        sent_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        Ok(ReminderRepository::mark_sent(&self.pool, id, sent_at).await?)
    }

    async fn record_delivery_failure(
        &self,
        id: Uuid,
        failure: DeliveryFailure,
    ) -> Result<bool, StoreError> {
        Ok(ReminderRepository::record_failure(
            &self.pool,
            id,
            to_i32(failure.attempts),
            failure.next_attempt_at,
            failure.give_up,
        )
        .await?)
    }

    async fn close_reminder(
        &self,
        id: Uuid,
        status: ReminderStatus,
        closed_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        Ok(ReminderRepository::close(&self.pool, id, status.as_str(), closed_at).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use serde_json::json;

    fn reminder_record(status: &str, content: serde_json::Value) -> ReminderRecord {
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        ReminderRecord {
            id: Uuid::new_v4(),
            user_id: 42,
            reminder_type: "lunch".to_string(),
            scheduled_date: date,
            scheduled_time: NaiveTime::from_hms_opt(13, 0, 0).unwrap(),
            reminder_time: NaiveTime::from_hms_opt(12, 55, 0).unwrap(),
            fire_at: date.and_hms_opt(12, 55, 0).unwrap(),
            content,
            related_id: Uuid::new_v4(),
            related_type: "diet".to_string(),
            status: status.to_string(),
            attempts: 2,
            next_attempt_at: None,
            created_at: Utc::now(),
            sent_at: None,
            completed_at: None,
        }
    }

    #[test]
    fn test_reminder_record_maps_to_domain() {
        let record = reminder_record(
            "sent",
            json!({"kind": "meal", "meal_name": "Dal and rice", "total_calories": 550}),
        );
        let reminder = record_to_reminder(record).unwrap();
        assert_eq!(reminder.status, ReminderStatus::Sent);
        assert_eq!(reminder.attempts, 2);
        assert_eq!(reminder.related_kind, ActivityKind::Diet);
    }

    #[test]
    fn test_unknown_status_is_reported_as_corrupt() {
        let record = reminder_record("delivered", json!({"kind": "meal", "meal_name": "x"}));
        assert!(matches!(
            record_to_reminder(record),
            Err(StoreError::Corrupt { entity: "reminder", .. })
        ));
    }

    #[test]
    fn test_legacy_generated_status_reads_as_scheduled() {
        let record = WorkoutRecord {
            id: Uuid::new_v4(),
            user_id: 42,
            workout_content: json!({"workout_type": "Arms", "exercises": [{"name": "Curls"}]}),
            status: "generated".to_string(),
            total_exercises: 1,
            exercises_completed: 0,
            exercises_skipped: 0,
            scheduled_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            completion_date: None,
            created_at: Utc::now(),
        };
        let activity = record_to_workout(record).unwrap();
        assert_eq!(activity.status, ActivityStatus::Scheduled);
        assert_eq!(activity.content.item_count(), 1);
    }
}
