//! Workout and exercise completion repositories

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

/// Workout record from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WorkoutRecord {
    pub id: Uuid,
    pub user_id: i64,
    pub workout_content: Value,
    pub status: String,
    pub total_exercises: i32,
    pub exercises_completed: i32,
    pub exercises_skipped: i32,
    pub scheduled_date: NaiveDate,
    pub completion_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Exercise completion record from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ExerciseCompletionRecord {
    pub id: Uuid,
    pub workout_id: Uuid,
    pub exercise_index: i32,
    pub exercise_name: String,
    pub status: String,
    pub completed_at: DateTime<Utc>,
}

/// Input for creating a workout
#[derive(Debug, Clone)]
pub struct CreateWorkout {
    pub id: Uuid,
    pub user_id: i64,
    pub workout_content: Value,
    pub total_exercises: i32,
    pub scheduled_date: NaiveDate,
}

/// Input for recording an exercise outcome
#[derive(Debug, Clone)]
pub struct CreateExerciseCompletion {
    pub workout_id: Uuid,
    pub exercise_index: i32,
    pub exercise_name: String,
    pub status: String,
    pub completed_at: DateTime<Utc>,
}

/// Aggregate columns written back after reconciliation
#[derive(Debug, Clone)]
pub struct WorkoutProgressUpdate {
    pub total_exercises: i32,
    pub exercises_completed: i32,
    pub exercises_skipped: i32,
    pub status: String,
    pub completion_date: Option<DateTime<Utc>>,
}

const WORKOUT_COLUMNS: &str = "id, user_id, workout_content, status, total_exercises, \
     exercises_completed, exercises_skipped, scheduled_date, completion_date, created_at";

/// Workout repository for database operations
pub struct WorkoutRepository;

impl WorkoutRepository {
    /// Create a workout in `scheduled` state
    pub async fn create(pool: &PgPool, input: CreateWorkout) -> sqlx::Result<WorkoutRecord> {
        let record = sqlx::query_as::<_, WorkoutRecord>(&format!(
            r#"
            INSERT INTO workouts (id, user_id, workout_content, status, total_exercises, scheduled_date)
            VALUES ($1, $2, $3, 'scheduled', $4, $5)
            RETURNING {WORKOUT_COLUMNS}
            "#
        ))
        .bind(input.id)
        .bind(input.user_id)
        .bind(&input.workout_content)
        .bind(input.total_exercises)
        .bind(input.scheduled_date)
        .fetch_one(pool)
        .await?;

        Ok(record)
    }

    /// Get workout by ID
    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<WorkoutRecord>> {
        let record = sqlx::query_as::<_, WorkoutRecord>(&format!(
            "SELECT {WORKOUT_COLUMNS} FROM workouts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    /// Get the N most recent workouts for a user
    pub async fn get_recent(
        pool: &PgPool,
        user_id: i64,
        limit: i64,
    ) -> sqlx::Result<Vec<WorkoutRecord>> {
        let records = sqlx::query_as::<_, WorkoutRecord>(&format!(
            r#"
            SELECT {WORKOUT_COLUMNS}
            FROM workouts
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(records)
    }

    /// Overwrite the aggregate progress columns
    pub async fn update_progress(
        pool: &PgPool,
        id: Uuid,
        update: WorkoutProgressUpdate,
    ) -> sqlx::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE workouts
            SET total_exercises = $2,
                exercises_completed = $3,
                exercises_skipped = $4,
                status = $5,
                completion_date = $6
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(update.total_exercises)
        .bind(update.exercises_completed)
        .bind(update.exercises_skipped)
        .bind(&update.status)
        .bind(update.completion_date)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Exercise completion repository for database operations
pub struct ExerciseCompletionRepository;

impl ExerciseCompletionRepository {
    /// Insert unless a record for the same exercise already exists
    pub async fn insert_if_absent(
        pool: &PgPool,
        input: CreateExerciseCompletion,
    ) -> sqlx::Result<Option<ExerciseCompletionRecord>> {
        let record = sqlx::query_as::<_, ExerciseCompletionRecord>(
            r#"
            INSERT INTO exercise_completions (id, workout_id, exercise_index, exercise_name, status, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (workout_id, exercise_index) DO NOTHING
            RETURNING id, workout_id, exercise_index, exercise_name, status, completed_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.workout_id)
        .bind(input.exercise_index)
        .bind(&input.exercise_name)
        .bind(&input.status)
        .bind(input.completed_at)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    pub async fn find(
        pool: &PgPool,
        workout_id: Uuid,
        exercise_index: i32,
    ) -> sqlx::Result<Option<ExerciseCompletionRecord>> {
        let record = sqlx::query_as::<_, ExerciseCompletionRecord>(
            r#"
            SELECT id, workout_id, exercise_index, exercise_name, status, completed_at
            FROM exercise_completions
            WHERE workout_id = $1 AND exercise_index = $2
            "#,
        )
        .bind(workout_id)
        .bind(exercise_index)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    /// All exercise outcomes of a workout
    pub async fn list_for_workout(
        pool: &PgPool,
        workout_id: Uuid,
    ) -> sqlx::Result<Vec<ExerciseCompletionRecord>> {
        let records = sqlx::query_as::<_, ExerciseCompletionRecord>(
            r#"
            SELECT id, workout_id, exercise_index, exercise_name, status, completed_at
            FROM exercise_completions
            WHERE workout_id = $1
            ORDER BY exercise_index
            "#,
        )
        .bind(workout_id)
        .fetch_all(pool)
        .await?;

        Ok(records)
    }
}
