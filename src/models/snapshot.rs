//! User snapshot model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::event::UserStatus;

/// Last known state of a panel user, used only for diffing.
///
/// Overwrite semantics: there is no ordering field, so a redelivered stale
/// event can revert the snapshot (last-write-wins, keyed by username).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserSnapshot {
    pub username: String,
    pub status: String,
    pub expire: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl UserSnapshot {
    pub fn status(&self) -> UserStatus {
        UserStatus::parse(&self.status)
    }
}
