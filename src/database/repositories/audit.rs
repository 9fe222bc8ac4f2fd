//! Audit log repository implementation
//!
//! The audit log is append-only: rows are never updated or deleted.

use sqlx::PgPool;
use chrono::Utc;
use crate::models::audit::AuditEntry;
use crate::utils::errors::PayBuddyError;

#[derive(Debug, Clone)]
pub struct AuditRepository {
    pool: PgPool,
}

impl AuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append one audit entry
    pub async fn append(
        &self,
        log_type: &str,
        username: Option<&str>,
        admin_telegram_id: Option<&str>,
        actor_telegram_id: Option<&str>,
        payload: Option<serde_json::Value>,
    ) -> Result<AuditEntry, PayBuddyError> {
        let entry = sqlx::query_as::<_, AuditEntry>(
            r#"
            INSERT INTO audit_log (log_type, username, admin_telegram_id, actor_telegram_id, payload_json, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, log_type, username, admin_telegram_id, actor_telegram_id, payload_json, created_at
            "#
        )
        .bind(log_type)
        .bind(username)
        .bind(admin_telegram_id)
        .bind(actor_telegram_id)
        .bind(payload)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(entry)
    }

    /// Count all audit entries
    pub async fn count(&self) -> Result<i64, PayBuddyError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM audit_log")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}
