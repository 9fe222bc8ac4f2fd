//! Admin destination repository implementation

use sqlx::PgPool;
use chrono::Utc;
use crate::models::admin_topic::AdminTopic;
use crate::utils::errors::PayBuddyError;

#[derive(Debug, Clone)]
pub struct AdminTopicRepository {
    pool: PgPool,
}

impl AdminTopicRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find the destination mapping for an admin
    pub async fn get(&self, admin_telegram_id: &str) -> Result<Option<AdminTopic>, PayBuddyError> {
        let topic = sqlx::query_as::<_, AdminTopic>(
            r#"
            SELECT admin_telegram_id, admin_username, chat_id, topic_id, created_at, updated_at
            FROM admin_topics WHERE admin_telegram_id = $1
            "#
        )
        .bind(admin_telegram_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(topic)
    }

    /// Create or replace a destination mapping
    pub async fn upsert(
        &self,
        admin_telegram_id: &str,
        admin_username: Option<&str>,
        chat_id: &str,
        topic_id: Option<&str>,
    ) -> Result<AdminTopic, PayBuddyError> {
        let topic = sqlx::query_as::<_, AdminTopic>(
            r#"
            INSERT INTO admin_topics (admin_telegram_id, admin_username, chat_id, topic_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            ON CONFLICT (admin_telegram_id)
            DO UPDATE SET admin_username = EXCLUDED.admin_username,
                          chat_id = EXCLUDED.chat_id,
                          topic_id = EXCLUDED.topic_id,
                          updated_at = EXCLUDED.updated_at
            RETURNING admin_telegram_id, admin_username, chat_id, topic_id, created_at, updated_at
            "#
        )
        .bind(admin_telegram_id)
        .bind(admin_username)
        .bind(chat_id)
        .bind(topic_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(topic)
    }

    /// Refresh only the display name, leaving chat and topic unchanged
    pub async fn update_username(
        &self,
        admin_telegram_id: &str,
        admin_username: &str,
    ) -> Result<(), PayBuddyError> {
        sqlx::query(
            "UPDATE admin_topics SET admin_username = $2, updated_at = $3 WHERE admin_telegram_id = $1"
        )
        .bind(admin_telegram_id)
        .bind(admin_username)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// List all destination mappings
    pub async fn list_all(&self) -> Result<Vec<AdminTopic>, PayBuddyError> {
        let topics = sqlx::query_as::<_, AdminTopic>(
            r#"
            SELECT admin_telegram_id, admin_username, chat_id, topic_id, created_at, updated_at
            FROM admin_topics ORDER BY created_at
            "#
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(topics)
    }

    /// Count registered admins
    pub async fn count(&self) -> Result<i64, PayBuddyError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM admin_topics")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    /// Explicit administrative clear of a mapping
    pub async fn delete(&self, admin_telegram_id: &str) -> Result<(), PayBuddyError> {
        sqlx::query("DELETE FROM admin_topics WHERE admin_telegram_id = $1")
            .bind(admin_telegram_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
