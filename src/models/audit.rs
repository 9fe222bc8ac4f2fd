//! Audit log model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Append-only audit record; never mutated or deleted
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditEntry {
    pub id: i64,
    pub log_type: String,
    pub username: Option<String>,
    pub admin_telegram_id: Option<String>,
    pub actor_telegram_id: Option<String>,
    pub payload_json: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}
