//! Sync flag repository implementation
//!
//! Generic key/value flags: the `initial_sync_complete` gate, the
//! `last_sync` timestamp, and similar process-wide markers. Values are read
//! at decision time, never cached.

use sqlx::PgPool;
use chrono::Utc;
use crate::utils::errors::PayBuddyError;

pub const INITIAL_SYNC_COMPLETE: &str = "initial_sync_complete";
pub const LAST_SYNC: &str = "last_sync";

#[derive(Debug, Clone)]
pub struct SyncFlagRepository {
    pool: PgPool,
}

impl SyncFlagRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a flag value
    pub async fn get(&self, key: &str) -> Result<Option<String>, PayBuddyError> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT value FROM sync_status WHERE key = $1"
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(value,)| value))
    }

    /// Set a flag value
    pub async fn set(&self, key: &str, value: &str) -> Result<(), PayBuddyError> {
        sqlx::query(
            r#"
            INSERT INTO sync_status (key, value, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (key)
            DO UPDATE SET value = EXCLUDED.value, updated_at = EXCLUDED.updated_at
            "#
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Whether the initial roster sync has completed
    pub async fn is_sync_complete(&self) -> Result<bool, PayBuddyError> {
        Ok(self.get(INITIAL_SYNC_COMPLETE).await?.as_deref() == Some("true"))
    }
}
