//! Destination setup dialog state machine
//!
//! `/set_admin_topic` collects two answers: the admin's Telegram id, then
//! the destination chat (with an optional topic id). The dialog is an
//! explicit state machine keyed by the operator's session; sessions expire
//! after a fixed TTL so abandoned dialogs clean themselves up.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::errors::{PayBuddyError, Result};

/// How long an unanswered dialog survives before it is abandoned
pub const SETUP_SESSION_TTL_MINUTES: i64 = 10;

/// Dialog position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetupState {
    AwaitingAdminId,
    AwaitingDestination { admin_telegram_id: String },
}

/// One operator's in-flight setup dialog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupSession {
    pub actor_id: i64,
    pub state: SetupState,
    pub started_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SetupSession {
    pub fn new(actor_id: i64) -> Self {
        let now = Utc::now();
        Self {
            actor_id,
            state: SetupState::AwaitingAdminId,
            started_at: now,
            expires_at: now + Duration::minutes(SETUP_SESSION_TTL_MINUTES),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Feed the first answer; advances to `AwaitingDestination`
    pub fn submit_admin_id(&mut self, input: &str) -> Result<()> {
        if !matches!(self.state, SetupState::AwaitingAdminId) {
            return Err(PayBuddyError::InvalidInput(
                "Dialog is not waiting for an admin ID".to_string(),
            ));
        }

        let trimmed = input.trim();
        if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Err(PayBuddyError::InvalidInput(
                "Telegram ID must be a number".to_string(),
            ));
        }

        self.state = SetupState::AwaitingDestination {
            admin_telegram_id: trimmed.to_string(),
        };
        Ok(())
    }
}

/// Parse the destination answer: a chat id, optionally followed by a topic
/// id. Chat ids may be negative (supergroups); topic ids must be positive.
pub fn parse_destination(input: &str) -> Result<(i64, Option<i64>)> {
    let mut parts = input.split_whitespace();

    let chat = parts
        .next()
        .ok_or_else(|| PayBuddyError::InvalidInput("Chat ID is required".to_string()))?;
    let chat_id: i64 = chat
        .parse()
        .map_err(|_| PayBuddyError::InvalidInput("Chat ID must be a number".to_string()))?;

    let topic_id = match parts.next() {
        Some(raw) => {
            let topic: i64 = raw.parse().map_err(|_| {
                PayBuddyError::InvalidInput("Topic ID must be a number".to_string())
            })?;
            if topic <= 0 {
                return Err(PayBuddyError::InvalidInput(
                    "Topic ID must be positive".to_string(),
                ));
            }
            Some(topic)
        }
        None => None,
    };

    Ok((chat_id, topic_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_dialog_happy_path() {
        let mut session = SetupSession::new(77);
        assert_eq!(session.state, SetupState::AwaitingAdminId);

        session.submit_admin_id(" 123456789 ").unwrap();
        assert_matches!(
            &session.state,
            SetupState::AwaitingDestination { admin_telegram_id } if admin_telegram_id == "123456789"
        );
    }

    #[test]
    fn test_non_numeric_admin_id_rejected() {
        let mut session = SetupSession::new(77);
        assert!(session.submit_admin_id("@alice").is_err());
        assert!(session.submit_admin_id("-42").is_err());
        assert_eq!(session.state, SetupState::AwaitingAdminId);
    }

    #[test]
    fn test_double_submit_rejected() {
        let mut session = SetupSession::new(77);
        session.submit_admin_id("1").unwrap();
        assert!(session.submit_admin_id("2").is_err());
    }

    #[test]
    fn test_parse_destination_forms() {
        assert_eq!(parse_destination("-1001234").unwrap(), (-1001234, None));
        assert_eq!(parse_destination("-1001234 55").unwrap(), (-1001234, Some(55)));
        assert!(parse_destination("").is_err());
        assert!(parse_destination("chat").is_err());
        assert!(parse_destination("-1001234 zero").is_err());
        assert!(parse_destination("-1001234 -5").is_err());
    }

    #[test]
    fn test_fresh_session_not_expired() {
        assert!(!SetupSession::new(77).is_expired());
    }
}
