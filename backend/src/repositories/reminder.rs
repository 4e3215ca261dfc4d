//! Reminder repository for database operations
//!
//! Status transitions are conditional updates; callers learn from the
//! returned flag whether their transition won.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

/// Reminder record from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReminderRecord {
    pub id: Uuid,
    pub user_id: i64,
    pub reminder_type: String,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    pub reminder_time: NaiveTime,
    pub fire_at: NaiveDateTime,
    pub content: Value,
    pub related_id: Uuid,
    pub related_type: String,
    pub status: String,
    pub attempts: i32,
    pub next_attempt_at: Option<NaiveDateTime>,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Input for creating a reminder
#[derive(Debug, Clone)]
pub struct CreateReminder {
    pub id: Uuid,
    pub user_id: i64,
    pub reminder_type: String,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    pub reminder_time: NaiveTime,
    pub fire_at: NaiveDateTime,
    pub content: Value,
    pub related_id: Uuid,
    pub related_type: String,
}

const REMINDER_COLUMNS: &str = "id, user_id, reminder_type, scheduled_date, scheduled_time, \
     reminder_time, fire_at, content, related_id, related_type, status, attempts, \
     next_attempt_at, created_at, sent_at, completed_at";

/// Reminder repository for database operations
pub struct ReminderRepository;

impl ReminderRepository {
    /// Create a reminder in `pending` state
    pub async fn create(pool: &PgPool, input: CreateReminder) -> sqlx::Result<ReminderRecord> {
        let record = sqlx::query_as::<_, ReminderRecord>(&format!(
            r#"
            INSERT INTO reminders (
                id, user_id, reminder_type, scheduled_date, scheduled_time, reminder_time,
                fire_at, content, related_id, related_type, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'pending')
            RETURNING {REMINDER_COLUMNS}
            "#
        ))
        .bind(input.id)
        .bind(input.user_id)
        .bind(&input.reminder_type)
        .bind(input.scheduled_date)
        .bind(input.scheduled_time)
        .bind(input.reminder_time)
        .bind(input.fire_at)
        .bind(&input.content)
        .bind(input.related_id)
        .bind(&input.related_type)
        .fetch_one(pool)
        .await?;

        Ok(record)
    }

    /// Get reminder by ID
    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<ReminderRecord>> {
        let record = sqlx::query_as::<_, ReminderRecord>(&format!(
            "SELECT {REMINDER_COLUMNS} FROM reminders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    /// Pending reminders due at `now`, oldest first
    pub async fn get_due(pool: &PgPool, now: NaiveDateTime) -> sqlx::Result<Vec<ReminderRecord>> {
        let records = sqlx::query_as::<_, ReminderRecord>(&format!(
            r#"
            SELECT {REMINDER_COLUMNS}
            FROM reminders
            WHERE status = 'pending'
              AND fire_at <= $1
              AND (next_attempt_at IS NULL OR next_attempt_at <= $1)
            ORDER BY fire_at, created_at
            "#
        ))
        .bind(now)
        .fetch_all(pool)
        .await?;

        Ok(records)
    }

    /// Reminders for a user, optionally limited to one activity date
    pub async fn get_for_user(
        pool: &PgPool,
        user_id: i64,
        date: Option<NaiveDate>,
    ) -> sqlx::Result<Vec<ReminderRecord>> {
        let records = sqlx::query_as::<_, ReminderRecord>(&format!(
            r#"
            SELECT {REMINDER_COLUMNS}
            FROM reminders
            WHERE user_id = $1
              AND ($2::date IS NULL OR scheduled_date = $2)
            ORDER BY fire_at, created_at
            "#
        ))
        .bind(user_id)
        .bind(date)
        .fetch_all(pool)
        .await?;

        Ok(records)
    }

    /// `pending -> sent`
    pub async fn mark_sent(
        pool: &PgPool,
        id: Uuid,
        sent_at: DateTime<Utc>,
    ) -> sqlx::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE reminders
            SET status = 'sent',
                sent_at = $2,
                attempts = attempts + 1,
                next_attempt_at = NULL
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(sent_at)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Record a failed attempt, optionally moving the reminder to `failed`
    pub async fn record_failure(
        pool: &PgPool,
        id: Uuid,
        attempts: i32,
        next_attempt_at: Option<NaiveDateTime>,
        give_up: bool,
    ) -> sqlx::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE reminders
            SET attempts = $2,
                next_attempt_at = $3,
                status = CASE WHEN $4 THEN 'failed' ELSE status END
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(attempts)
        .bind(next_attempt_at)
        .bind(give_up)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Move an open reminder to a closing status
    pub async fn close(
        pool: &PgPool,
        id: Uuid,
        status: &str,
        closed_at: DateTime<Utc>,
    ) -> sqlx::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE reminders
            SET status = $2,
                completed_at = $3
            WHERE id = $1 AND status IN ('pending', 'sent')
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(closed_at)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
