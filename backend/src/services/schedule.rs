//! Daily schedule generation
//!
//! Produces the day's workout and diet plan for a user, stores both, then
//! hands them to the reminder scheduler together with the user's times.

use super::scheduler::ReminderScheduler;
use crate::error::ServiceError;
use crate::generator::{fallback, next_muscle_group, ContentGenerator, ROTATION_WINDOW};
use crate::store::{ActivityStore, NewActivity};
use chrono::NaiveDate;
use fitness_coach_shared::{Activity, ActivityContent, ActivityKind, Reminder};
use serde::Serialize;
use tracing::{info, warn};

/// Everything created for one user and day
#[derive(Debug, Clone, Serialize)]
pub struct DailySchedule {
    pub muscle_group: String,
    pub workout: Activity,
    pub diet: Activity,
    pub reminders: Vec<Reminder>,
    /// Generator output was unusable and fixed plans were stored instead
    pub used_fallback: bool,
}

pub struct ScheduleService;

impl ScheduleService {
    pub async fn generate_daily_schedule(
        store: &dyn ActivityStore,
        generator: &dyn ContentGenerator,
        user_id: i64,
        date: NaiveDate,
    ) -> Result<DailySchedule, ServiceError> {
        let profile = store
            .get_user(user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User profile".to_string()))?;
        if !profile.is_complete() {
            return Err(ServiceError::Validation(
                "Profile is incomplete: age, height, weight, fitness level and goals are required"
                    .to_string(),
            ));
        }

        let history = store
            .recent_activities(ActivityKind::Workout, user_id, ROTATION_WINDOW)
            .await?;
        let muscle_group = next_muscle_group(&history);
        let mut used_fallback = false;

        let workout_content = match generator.generate_workout(&profile, muscle_group).await {
            Ok(content) => content,
            Err(e) => {
                warn!(user_id, muscle_group, error = %e, "Using fallback workout");
                used_fallback = true;
                fallback::workout(muscle_group, profile.fitness_level.as_deref())
            }
        };

        let diet_content = match generator.generate_diet(&profile).await {
            Ok(content) => content,
            Err(e) => {
                warn!(user_id, error = %e, "Using fallback diet");
                used_fallback = true;
                fallback::diet()
            }
        };

        let workout = store
            .insert_activity(NewActivity {
                user_id,
                content: ActivityContent::Workout(workout_content),
                scheduled_date: date,
            })
            .await?;
        let diet = store
            .insert_activity(NewActivity {
                user_id,
                content: ActivityContent::Diet(diet_content),
                scheduled_date: date,
            })
            .await?;

        let reminders = ReminderScheduler::create_daily_reminders(
            store,
            user_id,
            Some(&workout),
            Some(&diet),
            &profile.daily_times(),
            date,
        )
        .await?;

        info!(
            user_id,
            %date,
            muscle_group,
            workout_id = %workout.id,
            diet_id = %diet.id,
            reminders = reminders.len(),
            "Generated daily schedule"
        );

        Ok(DailySchedule {
            muscle_group: muscle_group.to_string(),
            workout,
            diet,
            reminders,
            used_fallback,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::DisabledGenerator;
    use crate::store::MemoryStore;
    use chrono::NaiveTime;
    use fitness_coach_shared::UserProfile;

    fn complete_profile(user_id: i64) -> UserProfile {
        UserProfile {
            user_id,
            first_name: Some("Sam".to_string()),
            age: Some(31),
            height_cm: Some(172.0),
            weight_kg: Some(70.5),
            fitness_level: Some("intermediate".to_string()),
            goals: Some("Build strength".to_string()),
            workout_time: NaiveTime::from_hms_opt(7, 0, 0),
            dinner_time: NaiveTime::from_hms_opt(19, 0, 0),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_generates_fallback_schedule() {
        let store = MemoryStore::new();
        store.upsert_user(&complete_profile(5)).await.unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();

        let schedule =
            ScheduleService::generate_daily_schedule(&store, &DisabledGenerator, 5, date)
                .await
                .unwrap();

        assert!(schedule.used_fallback);
        assert_eq!(schedule.muscle_group, "Full Body");
        assert_eq!(schedule.workout.total_items, 3);
        assert_eq!(schedule.diet.total_items, 5);
        assert_eq!(schedule.reminders.len(), 2);
    }

    #[tokio::test]
    async fn test_rotation_moves_on_next_day() {
        let store = MemoryStore::new();
        store.upsert_user(&complete_profile(5)).await.unwrap();
        let day_one = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();

        ScheduleService::generate_daily_schedule(&store, &DisabledGenerator, 5, day_one)
            .await
            .unwrap();
        let next = ScheduleService::generate_daily_schedule(
            &store,
            &DisabledGenerator,
            5,
            day_one.succ_opt().unwrap(),
        )
        .await
        .unwrap();

        // "Full Body" counts toward no group, so rotation starts at the first
        assert_eq!(next.muscle_group, "Arms");
    }

    #[tokio::test]
    async fn test_incomplete_profile_is_rejected() {
        let store = MemoryStore::new();
        store
            .upsert_user(&UserProfile {
                user_id: 6,
                ..Default::default()
            })
            .await
            .unwrap();

        let result = ScheduleService::generate_daily_schedule(
            &store,
            &DisabledGenerator,
            6,
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
        )
        .await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }
}
