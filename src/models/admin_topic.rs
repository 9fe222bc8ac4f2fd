//! Admin destination mapping model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Maps a panel admin's Telegram id to their notification destination.
///
/// `chat_id` may be empty when no parent chat was configured at registration
/// time (degraded but recorded); `topic_id` is absent when the destination
/// chat has no forum topics or provisioning failed.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AdminTopic {
    pub admin_telegram_id: String,
    pub admin_username: Option<String>,
    pub chat_id: String,
    pub topic_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AdminTopic {
    pub fn has_destination(&self) -> bool {
        !self.chat_id.is_empty()
    }
}
