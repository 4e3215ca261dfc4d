//! Workout and diet content generation
//!
//! [`OllamaGenerator`] asks a local LLM for JSON plans. Whenever it is
//! disabled or returns something unusable, callers fall back to the
//! deterministic plans in [`fallback`].

use async_trait::async_trait;
use fitness_coach_shared::{Activity, ActivityContent, DietContent, UserProfile, WorkoutContent};
use thiserror::Error;

pub mod fallback;
mod ollama;

pub use ollama::OllamaGenerator;

/// Muscle groups a workout rotation cycles through
pub const MUSCLE_GROUPS: [&str; 7] = ["Arms", "Chest", "Back", "Legs", "Shoulders", "Abs", "Cardio"];

/// Used when there is no workout history yet
pub const DEFAULT_MUSCLE_GROUP: &str = "Full Body";

/// Number of past workouts considered by the rotation
pub const ROTATION_WINDOW: usize = 5;

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Content generation is disabled")]
    Disabled,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Generator returned an unusable response: {0}")]
    InvalidResponse(String),
}

/// Produces plan content for a user
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate_workout(
        &self,
        profile: &UserProfile,
        muscle_group: &str,
    ) -> Result<WorkoutContent, GeneratorError>;

    async fn generate_diet(&self, profile: &UserProfile) -> Result<DietContent, GeneratorError>;
}

/// Generator that always defers to the fallback plans
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledGenerator;

#[async_trait]
impl ContentGenerator for DisabledGenerator {
    async fn generate_workout(
        &self,
        _profile: &UserProfile,
        _muscle_group: &str,
    ) -> Result<WorkoutContent, GeneratorError> {
        Err(GeneratorError::Disabled)
    }

    async fn generate_diet(&self, _profile: &UserProfile) -> Result<DietContent, GeneratorError> {
        Err(GeneratorError::Disabled)
    }
}

/// Pick the least-worked muscle group among the most recent workouts
///
/// `recent` is newest first. Ties prefer a group not trained in the last two
/// workouts, then rotation order.
pub fn next_muscle_group(recent: &[Activity]) -> &'static str {
    let recent_types: Vec<&str> = recent
        .iter()
        .take(ROTATION_WINDOW)
        .filter_map(|a| match &a.content {
            ActivityContent::Workout(w) => Some(w.workout_type.as_str()),
            ActivityContent::Diet(_) => None,
        })
        .collect();

    if recent_types.is_empty() {
        return DEFAULT_MUSCLE_GROUP;
    }

    let count = |group: &str| recent_types.iter().filter(|t| **t == group).count();
    let min_count = MUSCLE_GROUPS.iter().map(|g| count(*g)).min().unwrap_or(0);
    let least_worked: Vec<&'static str> = MUSCLE_GROUPS
        .iter()
        .copied()
        .filter(|g| count(*g) == min_count)
        .collect();

    let last_two = &recent_types[..recent_types.len().min(2)];
    least_worked
        .iter()
        .copied()
        .find(|g| !last_two.contains(g))
        .or_else(|| least_worked.first().copied())
        .unwrap_or(DEFAULT_MUSCLE_GROUP)
}
