use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// One act of recording consumption. `logged_date` is `logged_at`
/// projected into the user's timezone; the pair is validated before
/// insertion and never stored mismatched.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LogEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub food_id: Uuid,
    pub quantity: f64,
    pub unit: String,
    #[serde(with = "time::serde::rfc3339")]
    pub logged_at: OffsetDateTime,
    #[serde(with = "iso_date")]
    pub logged_date: Date,
}

#[derive(Debug, Clone)]
pub struct NewLogEntry {
    pub user_id: Uuid,
    pub food_id: Uuid,
    pub quantity: f64,
    pub unit: String,
    pub logged_at: OffsetDateTime,
    pub logged_date: Date,
}

#[async_trait]
pub trait LogStore: Send + Sync {
    async fn insert_entry(&self, new: NewLogEntry) -> anyhow::Result<LogEntry>;
    /// Distinct dates with at least one non-deleted entry for the user.
    async fn list_log_dates(&self, user_id: Uuid, since: Option<Date>)
        -> anyhow::Result<Vec<Date>>;
    /// Soft-remove; returns false when no live entry matched.
    async fn soft_delete(&self, user_id: Uuid, entry_id: Uuid) -> anyhow::Result<bool>;
}

pub struct PgLogStore {
    db: PgPool,
}

impl PgLogStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LogStore for PgLogStore {
    async fn insert_entry(&self, new: NewLogEntry) -> anyhow::Result<LogEntry> {
        let entry = sqlx::query_as::<_, LogEntry>(
            r#"
            INSERT INTO log_entries (user_id, food_id, quantity, unit, logged_at, logged_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, food_id, quantity, unit, logged_at, logged_date
            "#,
        )
        .bind(new.user_id)
        .bind(new.food_id)
        .bind(new.quantity)
        .bind(&new.unit)
        .bind(new.logged_at)
        .bind(new.logged_date)
        .fetch_one(&self.db)
        .await?;
        Ok(entry)
    }

    async fn list_log_dates(
        &self,
        user_id: Uuid,
        since: Option<Date>,
    ) -> anyhow::Result<Vec<Date>> {
        let dates = sqlx::query_scalar::<_, Date>(
            r#"
            SELECT DISTINCT logged_date
            FROM log_entries
            WHERE user_id = $1
              AND deleted_at IS NULL
              AND ($2::date IS NULL OR logged_date >= $2)
            ORDER BY logged_date
            "#,
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(&self.db)
        .await?;
        Ok(dates)
    }

    async fn soft_delete(&self, user_id: Uuid, entry_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE log_entries
            SET deleted_at = now()
            WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(entry_id)
        .bind(user_id)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
