/// Notification model
///
/// A notification fans out to a recipient list (`team`) and tracks read
/// receipts per recipient in `is_read`; marking read is always idempotent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Notification record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: Uuid,

    /// Recipient user ids
    pub team: Vec<Uuid>,

    /// Notification text
    pub text: String,

    /// Task this notification refers to; cascades on task delete
    pub task_id: Option<Uuid>,

    /// Recipients who have read it
    pub is_read: Vec<Uuid>,

    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Creates a notification for a set of recipients
    pub async fn create(
        pool: &PgPool,
        team: &[Uuid],
        text: &str,
        task_id: Option<Uuid>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (team, text, task_id)
            VALUES ($1, $2, $3)
            RETURNING id, team, text, task_id, is_read, created_at
            "#,
        )
        .bind(team)
        .bind(text)
        .bind(task_id)
        .fetch_one(pool)
        .await
    }

    /// Lists a user's unread notifications, newest first
    pub async fn list_unread(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, team, text, task_id, is_read, created_at
            FROM notifications
            WHERE team @> ARRAY[$1]::uuid[]
              AND NOT (is_read @> ARRAY[$1]::uuid[])
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Marks one notification read for a user; a repeat call is a no-op
    pub async fn mark_read(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET is_read = array_append(is_read, $2)
            WHERE id = $1
              AND team @> ARRAY[$2]::uuid[]
              AND NOT (is_read @> ARRAY[$2]::uuid[])
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Marks all of a user's notifications read
    pub async fn mark_all_read(pool: &PgPool, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET is_read = array_append(is_read, $1)
            WHERE team @> ARRAY[$1]::uuid[]
              AND NOT (is_read @> ARRAY[$1]::uuid[])
            "#,
        )
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}
