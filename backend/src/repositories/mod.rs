//! Database repositories
//!
//! Thin SQL wrappers returning raw records. Conversion into domain types
//! happens in [`crate::store::PgStore`].

pub mod diet;
pub mod reminder;
pub mod user;
pub mod workout;

pub use diet::{
    CreateDietCompletion, CreateDietPlan, DietCompletionRecord, DietCompletionRepository,
    DietPlanRecord, DietPlanRepository, DietProgressUpdate,
};
pub use reminder::{CreateReminder, ReminderRecord, ReminderRepository};
pub use user::{UpsertUser, UserRecord, UserRepository};
pub use workout::{
    CreateExerciseCompletion, CreateWorkout, ExerciseCompletionRecord,
    ExerciseCompletionRepository, WorkoutProgressUpdate, WorkoutRecord, WorkoutRepository,
};
