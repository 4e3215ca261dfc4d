//! User repository for database operations

use chrono::{DateTime, NaiveTime, Utc};
use sqlx::PgPool;

/// User record from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub user_id: i64,
    pub first_name: Option<String>,
    pub age: Option<i32>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub fitness_level: Option<String>,
    pub goals: Option<String>,
    pub workout_time: Option<NaiveTime>,
    pub breakfast_time: Option<NaiveTime>,
    pub lunch_time: Option<NaiveTime>,
    pub dinner_time: Option<NaiveTime>,
    pub snack_time: Option<NaiveTime>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating or replacing a user profile
#[derive(Debug, Clone, Default)]
pub struct UpsertUser {
    pub user_id: i64,
    pub first_name: Option<String>,
    pub age: Option<i32>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub fitness_level: Option<String>,
    pub goals: Option<String>,
    pub workout_time: Option<NaiveTime>,
    pub breakfast_time: Option<NaiveTime>,
    pub lunch_time: Option<NaiveTime>,
    pub dinner_time: Option<NaiveTime>,
    pub snack_time: Option<NaiveTime>,
}

/// User repository for database operations
pub struct UserRepository;

impl UserRepository {
    /// Insert a user or replace every profile field of an existing one
    pub async fn upsert(pool: &PgPool, input: UpsertUser) -> sqlx::Result<UserRecord> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (
                user_id, first_name, age, height_cm, weight_kg, fitness_level, goals,
                workout_time, breakfast_time, lunch_time, dinner_time, snack_time
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (user_id) DO UPDATE SET
                first_name = EXCLUDED.first_name,
                age = EXCLUDED.age,
                height_cm = EXCLUDED.height_cm,
                weight_kg = EXCLUDED.weight_kg,
                fitness_level = EXCLUDED.fitness_level,
                goals = EXCLUDED.goals,
                workout_time = EXCLUDED.workout_time,
                breakfast_time = EXCLUDED.breakfast_time,
                lunch_time = EXCLUDED.lunch_time,
                dinner_time = EXCLUDED.dinner_time,
                snack_time = EXCLUDED.snack_time,
                updated_at = NOW()
            RETURNING user_id, first_name, age, height_cm, weight_kg, fitness_level, goals,
                      workout_time, breakfast_time, lunch_time, dinner_time, snack_time,
                      created_at, updated_at
            "#,
        )
        .bind(input.user_id)
        .bind(&input.first_name)
        .bind(input.age)
        .bind(input.height_cm)
        .bind(input.weight_kg)
        .bind(&input.fitness_level)
        .bind(&input.goals)
        .bind(input.workout_time)
        .bind(input.breakfast_time)
        .bind(input.lunch_time)
        .bind(input.dinner_time)
        .bind(input.snack_time)
        .fetch_one(pool)
        .await?;

        Ok(record)
    }

    /// Find user by chat id
    pub async fn find_by_id(pool: &PgPool, user_id: i64) -> sqlx::Result<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT user_id, first_name, age, height_cm, weight_kg, fitness_level, goals,
                   workout_time, breakfast_time, lunch_time, dinner_time, snack_time,
                   created_at, updated_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }
}
