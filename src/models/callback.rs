//! Inline keyboard callback tokens
//!
//! Button presses carry a compact colon-delimited token:
//! `<action>:<username>:<admin_telegram_id>:<event_key>`. Telegram caps
//! callback data at 64 bytes, so the encoder trims the event key to fit;
//! the decoder rejects anything that is not exactly four fields.

use serde::{Deserialize, Serialize};

use crate::utils::errors::{PayBuddyError, Result};

/// Hard upper bound on encoded callback data (Telegram limit)
pub const MAX_CALLBACK_DATA_BYTES: usize = 64;

/// The closed set of interactive actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallbackAction {
    Paid,
    Unpaid,
    AddSettlement,
}

impl CallbackAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallbackAction::Paid => "paid",
            CallbackAction::Unpaid => "unpaid",
            CallbackAction::AddSettlement => "add_settlement",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "paid" => Some(CallbackAction::Paid),
            "unpaid" => Some(CallbackAction::Unpaid),
            "add_settlement" => Some(CallbackAction::AddSettlement),
            _ => None,
        }
    }
}

impl std::fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded callback token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackToken {
    pub action: CallbackAction,
    pub username: String,
    pub admin_telegram_id: String,
    pub event_key: String,
}

impl CallbackToken {
    pub fn new(
        action: CallbackAction,
        username: impl Into<String>,
        admin_telegram_id: impl Into<String>,
        event_key: impl Into<String>,
    ) -> Self {
        Self {
            action,
            username: username.into(),
            admin_telegram_id: admin_telegram_id.into(),
            event_key: event_key.into(),
        }
    }

    /// Encode the token, trimming the event key so the result stays within
    /// the 64-byte callback-data limit. Trimming is silent and lossy.
    pub fn encode(&self) -> String {
        let overhead = self.action.as_str().len()
            + self.username.len()
            + self.admin_telegram_id.len()
            + 3;

        let key_budget = MAX_CALLBACK_DATA_BYTES.saturating_sub(overhead);
        let key = truncate_bytes(&self.event_key, key_budget);

        let encoded = format!(
            "{}:{}:{}:{}",
            self.action.as_str(),
            self.username,
            self.admin_telegram_id,
            key
        );

        // Oversized usernames can still overflow the cap even with an empty key
        truncate_bytes(&encoded, MAX_CALLBACK_DATA_BYTES).to_string()
    }

    /// Decode a callback token, rejecting anything that is not exactly
    /// four colon-delimited fields with a known action.
    pub fn parse(data: &str) -> Result<Self> {
        let parts: Vec<&str> = data.split(':').collect();
        if parts.len() != 4 {
            return Err(PayBuddyError::InvalidInput(format!(
                "Invalid callback data format: expected 4 fields, got {}",
                parts.len()
            )));
        }

        let action = CallbackAction::parse(parts[0]).ok_or_else(|| {
            PayBuddyError::InvalidInput(format!("Unknown callback action: {}", parts[0]))
        })?;

        Ok(Self {
            action,
            username: parts[1].to_string(),
            admin_telegram_id: parts[2].to_string(),
            event_key: parts[3].to_string(),
        })
    }
}

/// Generate the idempotency key correlating a notification to later button
/// presses: stable for a given (event kind, username, send time).
pub fn generate_event_key(kind: &str, username: &str, send_at: i64) -> String {
    format!("{}_{}_{}", kind, username, send_at)
}

fn truncate_bytes(value: &str, max: usize) -> &str {
    if value.len() <= max {
        return value;
    }
    let mut end = max;
    while end > 0 && !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_roundtrip() {
        let token = CallbackToken::new(
            CallbackAction::Paid,
            "alice",
            "4242",
            "created_alice_1700000000",
        );
        let decoded = CallbackToken::parse(&token.encode()).unwrap();
        assert_eq!(decoded, token);
    }

    #[test]
    fn test_key_trimmed_to_fit() {
        let token = CallbackToken::new(
            CallbackAction::AddSettlement,
            "very_long_username_here",
            "123456789",
            "updated_very_long_username_here_1700000000",
        );
        let encoded = token.encode();
        assert!(encoded.len() <= MAX_CALLBACK_DATA_BYTES);

        // Field structure survives trimming
        let decoded = CallbackToken::parse(&encoded).unwrap();
        assert_eq!(decoded.action, CallbackAction::AddSettlement);
        assert_eq!(decoded.username, "very_long_username_here");
    }

    #[test]
    fn test_wrong_field_count_rejected() {
        assert!(CallbackToken::parse("paid:alice:4242").is_err());
        assert!(CallbackToken::parse("paid:alice:4242:key:extra").is_err());
        assert!(CallbackToken::parse("").is_err());
    }

    #[test]
    fn test_unknown_action_rejected() {
        assert!(CallbackToken::parse("refund:alice:4242:key").is_err());
    }

    #[test]
    fn test_event_key_shape() {
        assert_eq!(
            generate_event_key("created", "alice", 1700000000),
            "created_alice_1700000000"
        );
    }

    proptest! {
        #[test]
        fn encoded_tokens_never_exceed_limit(
            username in "[a-zA-Z0-9_]{0,80}",
            admin_id in "[0-9]{1,20}",
            key in "[a-z0-9_]{0,80}",
        ) {
            let token = CallbackToken::new(CallbackAction::Unpaid, username, admin_id, key);
            prop_assert!(token.encode().len() <= MAX_CALLBACK_DATA_BYTES);
        }
    }
}
