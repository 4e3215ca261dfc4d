//! Reminder scheduler
//!
//! Turns a user's daily time preferences into pending reminder rows. The
//! fire instant is computed once here and never recomputed.

use crate::error::ServiceError;
use crate::store::{ActivityStore, NewReminder};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use fitness_coach_shared::{
    fire_at, fire_time, Activity, ActivityContent, DailyTimes, Reminder, ReminderCategory,
    ReminderSnapshot,
};
use tracing::{info, warn};

pub struct ReminderScheduler;

impl ReminderScheduler {
    /// Create one reminder per configured slot for `date`
    ///
    /// A slot is skipped, with a warning, when its activity is missing or the
    /// diet has no meal for it. Calling twice creates duplicates; the daily
    /// schedule flow calls this once per user and day.
    pub async fn create_daily_reminders(
        store: &dyn ActivityStore,
        user_id: i64,
        workout: Option<&Activity>,
        diet: Option<&Activity>,
        times: &DailyTimes,
        date: NaiveDate,
    ) -> Result<Vec<Reminder>, ServiceError> {
        let mut created = Vec::new();

        for (category, target) in times.slots() {
            let Some((activity, snapshot)) = Self::slot_content(category, workout, diet) else {
                warn!(user_id, category = %category, "No content for reminder slot, skipping");
                continue;
            };

            let reminder = store
                .insert_reminder(Self::new_reminder(user_id, category, activity, snapshot, date, target))
                .await?;

            info!(
                reminder_id = %reminder.id,
                user_id,
                category = %category,
                fire_at = %reminder.fire_at,
                "Created reminder"
            );
            created.push(reminder);
        }

        Ok(created)
    }

    /// Pending reminders due at `now`
    pub async fn due_reminders(
        store: &dyn ActivityStore,
        now: NaiveDateTime,
    ) -> Result<Vec<Reminder>, ServiceError> {
        Ok(store.due_reminders(now).await?)
    }

    fn new_reminder(
        user_id: i64,
        category: ReminderCategory,
        activity: &Activity,
        snapshot: ReminderSnapshot,
        date: NaiveDate,
        target: NaiveTime,
    ) -> NewReminder {
        NewReminder {
            user_id,
            category,
            scheduled_date: date,
            target_time: target,
            fire_time: fire_time(target),
            fire_at: fire_at(date, target),
            snapshot,
            related_id: activity.id,
            related_kind: activity.kind(),
        }
    }

    /// The activity a slot refers to and the display fields to capture
    fn slot_content<'a>(
        category: ReminderCategory,
        workout: Option<&'a Activity>,
        diet: Option<&'a Activity>,
    ) -> Option<(&'a Activity, ReminderSnapshot)> {
        match category.meal_slot() {
            None => {
                let activity = workout?;
                let ActivityContent::Workout(content) = &activity.content else {
                    return None;
                };
                Some((
                    activity,
                    ReminderSnapshot::Workout {
                        workout_type: content.workout_type.clone(),
                        duration_minutes: content.duration_minutes,
                        calories_estimate: content.calories_estimate,
                    },
                ))
            }
            Some(slot) => {
                let activity = diet?;
                let ActivityContent::Diet(content) = &activity.content else {
                    return None;
                };
                let meal = content.meal_for_slot(slot)?;
                Some((
                    activity,
                    ReminderSnapshot::Meal {
                        meal_name: meal.display_name(slot),
                        total_calories: meal.total_calories,
                    },
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::fallback;
    use crate::store::{MemoryStore, NewActivity};
    use fitness_coach_shared::{ActivityKind, DietContent, Meal, ReminderStatus};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    async fn seed(store: &MemoryStore, content: ActivityContent) -> Activity {
        store
            .insert_activity(NewActivity {
                user_id: 9,
                content,
                scheduled_date: date(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_one_reminder_per_slot() {
        let store = MemoryStore::new();
        let workout = seed(&store, ActivityContent::Workout(fallback::workout("Legs", None))).await;
        let diet = seed(&store, ActivityContent::Diet(fallback::diet())).await;
        let times = DailyTimes {
            workout: Some(at(7, 0)),
            breakfast: Some(at(8, 0)),
            lunch: Some(at(13, 0)),
            dinner: Some(at(19, 30)),
            snack: Some(at(16, 0)),
        };

        let reminders = ReminderScheduler::create_daily_reminders(
            &store,
            9,
            Some(&workout),
            Some(&diet),
            &times,
            date(),
        )
        .await
        .unwrap();

        assert_eq!(reminders.len(), 5);
        let workout_reminder = &reminders[0];
        assert_eq!(workout_reminder.category, ReminderCategory::Workout);
        assert_eq!(workout_reminder.fire_time, at(6, 55));
        assert_eq!(workout_reminder.fire_at, date().and_time(at(6, 55)));
        assert_eq!(workout_reminder.related_kind, ActivityKind::Workout);
        assert_eq!(workout_reminder.status, ReminderStatus::Pending);

        let snack = &reminders[4];
        assert_eq!(snack.category, ReminderCategory::Snack);
        assert_eq!(
            snack.snapshot,
            ReminderSnapshot::Meal {
                meal_name: "Sprouts Chaat".to_string(),
                total_calories: Some(150),
            }
        );
    }

    #[tokio::test]
    async fn test_midnight_target_fires_previous_day() {
        let store = MemoryStore::new();
        let workout = seed(&store, ActivityContent::Workout(fallback::workout("Abs", None))).await;
        let times = DailyTimes {
            workout: Some(at(0, 2)),
            ..Default::default()
        };

        let reminders =
            ReminderScheduler::create_daily_reminders(&store, 9, Some(&workout), None, &times, date())
                .await
                .unwrap();

        assert_eq!(reminders[0].fire_time, at(23, 57));
        assert_eq!(
            reminders[0].fire_at,
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap().and_time(at(23, 57))
        );
    }

    #[tokio::test]
    async fn test_slot_without_meal_is_skipped() {
        let store = MemoryStore::new();
        let diet = seed(
            &store,
            ActivityContent::Diet(DietContent {
                meals: vec![Meal::named("Big Brunch", 900)],
                snacks: vec![],
                total_calories: Some(900),
                extra: Default::default(),
            }),
        )
        .await;
        let times = DailyTimes {
            workout: Some(at(7, 0)),
            lunch: Some(at(12, 0)),
            snack: Some(at(16, 0)),
            ..Default::default()
        };

        let reminders =
            ReminderScheduler::create_daily_reminders(&store, 9, None, Some(&diet), &times, date())
                .await
                .unwrap();

        // no workout and no snacks: only lunch, which falls back to the sole meal
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].category, ReminderCategory::Lunch);
        assert_eq!(
            reminders[0].snapshot,
            ReminderSnapshot::Meal {
                meal_name: "Big Brunch".to_string(),
                total_calories: Some(900),
            }
        );
    }

    #[tokio::test]
    async fn test_due_query_respects_fire_instant() {
        let store = MemoryStore::new();
        let workout = seed(&store, ActivityContent::Workout(fallback::workout("Legs", None))).await;
        let times = DailyTimes {
            workout: Some(at(7, 0)),
            ..Default::default()
        };
        ReminderScheduler::create_daily_reminders(&store, 9, Some(&workout), None, &times, date())
            .await
            .unwrap();

        let before = ReminderScheduler::due_reminders(&store, date().and_time(at(6, 54)))
            .await
            .unwrap();
        assert!(before.is_empty());

        let due = ReminderScheduler::due_reminders(&store, date().and_time(at(6, 55)))
            .await
            .unwrap();
        assert_eq!(due.len(), 1);
    }
}
