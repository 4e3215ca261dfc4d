//! Diet plan and meal completion repositories

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

/// Diet plan record from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DietPlanRecord {
    pub id: Uuid,
    pub user_id: i64,
    pub diet_content: Value,
    pub status: String,
    pub total_meals: i32,
    pub meals_completed: i32,
    pub meals_skipped: i32,
    pub scheduled_date: NaiveDate,
    pub completion_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Meal completion record from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DietCompletionRecord {
    pub id: Uuid,
    pub diet_plan_id: Uuid,
    pub meal_type: String,
    pub meal_name: String,
    pub status: String,
    pub completed_at: DateTime<Utc>,
}

/// Input for creating a diet plan
#[derive(Debug, Clone)]
pub struct CreateDietPlan {
    pub id: Uuid,
    pub user_id: i64,
    pub diet_content: Value,
    pub total_meals: i32,
    pub scheduled_date: NaiveDate,
}

/// Input for recording a meal outcome
#[derive(Debug, Clone)]
pub struct CreateDietCompletion {
    pub diet_plan_id: Uuid,
    pub meal_type: String,
    pub meal_name: String,
    pub status: String,
    pub completed_at: DateTime<Utc>,
}

/// Aggregate columns written back after reconciliation
#[derive(Debug, Clone)]
pub struct DietProgressUpdate {
    pub total_meals: i32,
    pub meals_completed: i32,
    pub meals_skipped: i32,
    pub status: String,
    pub completion_date: Option<DateTime<Utc>>,
}

const DIET_COLUMNS: &str = "id, user_id, diet_content, status, total_meals, meals_completed, \
     meals_skipped, scheduled_date, completion_date, created_at";

/// Diet plan repository for database operations
pub struct DietPlanRepository;

impl DietPlanRepository {
    /// Create a diet plan in `scheduled` state
    pub async fn create(pool: &PgPool, input: CreateDietPlan) -> sqlx::Result<DietPlanRecord> {
        let record = sqlx::query_as::<_, DietPlanRecord>(&format!(
            r#"
            INSERT INTO diet_plans (id, user_id, diet_content, status, total_meals, scheduled_date)
            VALUES ($1, $2, $3, 'scheduled', $4, $5)
            RETURNING {DIET_COLUMNS}
            "#
        ))
        .bind(input.id)
        .bind(input.user_id)
        .bind(&input.diet_content)
        .bind(input.total_meals)
        .bind(input.scheduled_date)
        .fetch_one(pool)
        .await?;

        Ok(record)
    }

    /// Get diet plan by ID
    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<DietPlanRecord>> {
        let record = sqlx::query_as::<_, DietPlanRecord>(&format!(
            "SELECT {DIET_COLUMNS} FROM diet_plans WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    /// Get the N most recent diet plans for a user
    pub async fn get_recent(
        pool: &PgPool,
        user_id: i64,
        limit: i64,
    ) -> sqlx::Result<Vec<DietPlanRecord>> {
        let records = sqlx::query_as::<_, DietPlanRecord>(&format!(
            r#"
            SELECT {DIET_COLUMNS}
            FROM diet_plans
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
        update: DietProgressUpdate,
    ) -> sqlx::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE diet_plans
            SET total_meals = $2,
                meals_completed = $3,
                meals_skipped = $4,
                status = $5,
                completion_date = $6
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(update.total_meals)
        .bind(update.meals_completed)
        .bind(update.meals_skipped)
        .bind(&update.status)
        .bind(update.completion_date)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Meal completion repository for database operations
pub struct DietCompletionRepository;

impl DietCompletionRepository {
    /// Insert unless a record for the same meal slot already exists
    pub async fn insert_if_absent(
        pool: &PgPool,
        input: CreateDietCompletion,
    ) -> sqlx::Result<Option<DietCompletionRecord>> {
        let record = sqlx::query_as::<_, DietCompletionRecord>(
            r#"
            INSERT INTO diet_completions (id, diet_plan_id, meal_type, meal_name, status, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (diet_plan_id, meal_type) DO NOTHING
            RETURNING id, diet_plan_id, meal_type, meal_name, status, completed_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.diet_plan_id)
        .bind(&input.meal_type)
        .bind(&input.meal_name)
        .bind(&input.status)
        .bind(input.completed_at)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    pub async fn find(
        pool: &PgPool,
        diet_plan_id: Uuid,
        meal_type: &str,
    ) -> sqlx::Result<Option<DietCompletionRecord>> {
        let record = sqlx::query_as::<_, DietCompletionRecord>(
            r#"
            SELECT id, diet_plan_id, meal_type, meal_name, status, completed_at
            FROM diet_completions
            WHERE diet_plan_id = $1 AND meal_type = $2
            "#,
        )
        .bind(diet_plan_id)
        .bind(meal_type)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    /// All meal outcomes of a diet plan
    pub async fn list_for_plan(
        pool: &PgPool,
        diet_plan_id: Uuid,
    ) -> sqlx::Result<Vec<DietCompletionRecord>> {
        let records = sqlx::query_as::<_, DietCompletionRecord>(
            r#"
            SELECT id, diet_plan_id, meal_type, meal_name, status, completed_at
            FROM diet_completions
            WHERE diet_plan_id = $1
            ORDER BY completed_at
            "#,
        )
        .bind(diet_plan_id)
        .fetch_all(pool)
        .await?;

        Ok(records)
    }
}
