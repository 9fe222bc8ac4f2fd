//! User snapshot repository implementation

use sqlx::PgPool;
use chrono::Utc;
use crate::models::snapshot::UserSnapshot;
use crate::utils::errors::PayBuddyError;

#[derive(Debug, Clone)]
pub struct SnapshotRepository {
    pool: PgPool,
}

impl SnapshotRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the last known state for a username
    pub async fn get(&self, username: &str) -> Result<Option<UserSnapshot>, PayBuddyError> {
        let snapshot = sqlx::query_as::<_, UserSnapshot>(
            "SELECT username, status, expire, updated_at FROM user_snapshots WHERE username = $1"
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(snapshot)
    }

    /// Save or overwrite the snapshot for a username.
    ///
    /// Last-write-wins: there is no ordering field, so out-of-order webhook
    /// redelivery can revert a newer state.
    pub async fn upsert(
        &self,
        username: &str,
        status: &str,
        expire: Option<&str>,
    ) -> Result<UserSnapshot, PayBuddyError> {
        let snapshot = sqlx::query_as::<_, UserSnapshot>(
            r#"
            INSERT INTO user_snapshots (username, status, expire, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (username)
            DO UPDATE SET status = EXCLUDED.status,
                          expire = EXCLUDED.expire,
                          updated_at = EXCLUDED.updated_at
            RETURNING username, status, expire, updated_at
            "#
        )
        .bind(username)
        .bind(status)
        .bind(expire)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(snapshot)
    }
}
