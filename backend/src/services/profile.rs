//! Profile service - create-or-update of a user's profile and daily times

use crate::error::ServiceError;
use crate::store::ActivityStore;
use fitness_coach_shared::validation::{
    validate_age, validate_fitness_level, validate_height_cm, validate_weight_kg,
};
use fitness_coach_shared::{parse_clock_time, UserProfile};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

/// Profile fields to set; absent fields keep their stored value
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ProfileUpdate {
    #[validate(length(min = 1, max = 64))]
    pub first_name: Option<String>,
    pub age: Option<i32>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub fitness_level: Option<String>,
    #[validate(length(min = 1, max = 500))]
    pub goals: Option<String>,
    /// `HH:MM`
    pub workout_time: Option<String>,
    pub breakfast_time: Option<String>,
    pub lunch_time: Option<String>,
    pub dinner_time: Option<String>,
    pub snack_time: Option<String>,
}

pub struct ProfileService;

impl ProfileService {
    pub async fn get_profile(
        store: &dyn ActivityStore,
        user_id: i64,
    ) -> Result<UserProfile, ServiceError> {
        store
            .get_user(user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User profile".to_string()))
    }

    /// Create the profile or update the provided fields
    pub async fn upsert_profile(
        store: &dyn ActivityStore,
        user_id: i64,
        update: ProfileUpdate,
    ) -> Result<UserProfile, ServiceError> {
        Self::validate(&update)?;

        let mut profile = store.get_user(user_id).await?.unwrap_or(UserProfile {
            user_id,
            ..Default::default()
        });

        if let Some(name) = update.first_name {
            profile.first_name = Some(name);
        }
        if let Some(age) = update.age {
            profile.age = Some(age);
        }
        if let Some(height) = update.height_cm {
            profile.height_cm = Some(height);
        }
        if let Some(weight) = update.weight_kg {
            profile.weight_kg = Some(weight);
        }
        if let Some(level) = update.fitness_level {
            profile.fitness_level = Some(level.to_lowercase());
        }
        if let Some(goals) = update.goals {
            profile.goals = Some(goals);
        }

        let times = [
            (update.workout_time, &mut profile.workout_time),
            (update.breakfast_time, &mut profile.breakfast_time),
            (update.lunch_time, &mut profile.lunch_time),
            (update.dinner_time, &mut profile.dinner_time),
            (update.snack_time, &mut profile.snack_time),
        ];
        for (input, slot) in times {
            if let Some(value) = input {
                *slot = Some(parse_clock_time(&value)?);
            }
        }

        let saved = store.upsert_user(&profile).await?;
        info!(user_id, complete = saved.is_complete(), "Saved user profile");
        Ok(saved)
    }

    /// Validate a profile update
    fn validate(update: &ProfileUpdate) -> Result<(), ServiceError> {
        update
            .validate()
            .map_err(|e| ServiceError::Validation(e.to_string()))?;

        let checks = [
            update.age.map(validate_age),
            update.height_cm.map(validate_height_cm),
            update.weight_kg.map(validate_weight_kg),
            update.fitness_level.as_deref().map(validate_fitness_level),
        ];
        for check in checks.into_iter().flatten() {
            check.map_err(ServiceError::Validation)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::NaiveTime;
    use rstest::rstest;

    #[tokio::test]
    async fn test_upsert_merges_fields() {
        let store = MemoryStore::new();
        ProfileService::upsert_profile(
            &store,
            3,
            ProfileUpdate {
                age: Some(40),
                workout_time: Some("06:30".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let profile = ProfileService::upsert_profile(
            &store,
            3,
            ProfileUpdate {
                fitness_level: Some("Advanced".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(profile.age, Some(40));
        assert_eq!(profile.fitness_level.as_deref(), Some("advanced"));
        assert_eq!(profile.workout_time, NaiveTime::from_hms_opt(6, 30, 0));
        assert!(!profile.is_complete());
    }

    #[rstest]
    #[case(ProfileUpdate { age: Some(9), ..Default::default() })]
    #[case(ProfileUpdate { height_cm: Some(20.0), ..Default::default() })]
    #[case(ProfileUpdate { fitness_level: Some("elite".to_string()), ..Default::default() })]
    #[case(ProfileUpdate { goals: Some(String::new()), ..Default::default() })]
    #[case(ProfileUpdate { lunch_time: Some("25:00".to_string()), ..Default::default() })]
    #[tokio::test]
    async fn test_invalid_updates_are_rejected(#[case] update: ProfileUpdate) {
        let store = MemoryStore::new();
        let result = ProfileService::upsert_profile(&store, 3, update).await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
        assert!(store.get_user(3).await.unwrap().is_none());
    }
}
