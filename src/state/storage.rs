//! Session storage implementation
//!
//! This module persists setup dialog sessions in Redis, including
//! serialization, TTL-backed expiration and cleanup.

use redis::AsyncCommands;
use tracing::{debug, warn};

use crate::config::RedisConfig;
use crate::utils::errors::Result;
use super::session::SetupSession;

/// Redis-backed session storage
#[derive(Clone)]
pub struct SessionStorage {
    connection_manager: redis::aio::ConnectionManager,
    config: RedisConfig,
}

impl SessionStorage {
    /// Create a new session storage instance
    pub async fn new(config: RedisConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str())?;
        let connection_manager = redis::aio::ConnectionManager::new(client).await?;

        Ok(Self {
            connection_manager,
            config,
        })
    }

    /// Save a dialog session, with the remaining session lifetime as TTL
    pub async fn save_session(&self, session: &SetupSession) -> Result<()> {
        let key = self.session_key(session.actor_id);
        let serialized = serde_json::to_string(session)?;

        let remaining = (session.expires_at - chrono::Utc::now()).num_seconds();
        let ttl_seconds = remaining.max(60) as u64;

        let mut conn = self.connection_manager.clone();
        conn.set_ex::<_, _, ()>(&key, serialized, ttl_seconds).await?;

        debug!(actor_id = session.actor_id, ttl_seconds = ttl_seconds, "Session saved");
        Ok(())
    }

    /// Load the dialog session for an operator, dropping expired ones
    pub async fn load_session(&self, actor_id: i64) -> Result<Option<SetupSession>> {
        let key = self.session_key(actor_id);
        let mut conn = self.connection_manager.clone();

        let serialized: Option<String> = conn.get(&key).await?;
        let Some(data) = serialized else {
            return Ok(None);
        };

        let session: SetupSession = match serde_json::from_str(&data) {
            Ok(session) => session,
            Err(e) => {
                warn!(actor_id = actor_id, error = %e, "Dropping corrupt session payload");
                self.delete_session(actor_id).await?;
                return Ok(None);
            }
        };

        if session.is_expired() {
            debug!(actor_id = actor_id, "Session expired, removing");
            self.delete_session(actor_id).await?;
            return Ok(None);
        }

        Ok(Some(session))
    }

    /// Delete the dialog session for an operator
    pub async fn delete_session(&self, actor_id: i64) -> Result<()> {
        let key = self.session_key(actor_id);
        let mut conn = self.connection_manager.clone();
        let _: u32 = conn.del(&key).await?;
        Ok(())
    }

    /// Test Redis connectivity
    pub async fn test_connection(&self) -> Result<()> {
        let mut conn = self.connection_manager.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    fn session_key(&self, actor_id: i64) -> String {
        format!("{}setup:{}", self.config.prefix, actor_id)
    }
}

impl std::fmt::Debug for SessionStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStorage")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
