//! Webhook event payloads
//!
//! Normalized shapes for panel lifecycle events delivered to the webhook
//! endpoint. The panel posts either a single event object or an array of them.

use serde::{Deserialize, Deserializer, Serialize};

/// Lifecycle actions the triage engine understands.
///
/// Anything else deserializes to `Other` and is ignored downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    UserCreated,
    UserUpdated,
    #[serde(other)]
    Other,
}

impl EventAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventAction::UserCreated => "user_created",
            EventAction::UserUpdated => "user_updated",
            EventAction::Other => "other",
        }
    }

    /// Short tag used when building event keys ("created"/"updated")
    pub fn key_tag(&self) -> &'static str {
        match self {
            EventAction::UserCreated => "created",
            EventAction::UserUpdated => "updated",
            EventAction::Other => "other",
        }
    }
}

/// Account status as reported by the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Active,
    Disabled,
    Limited,
    Expired,
    OnHold,
    #[serde(other)]
    Unknown,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Disabled => "disabled",
            UserStatus::Limited => "limited",
            UserStatus::Expired => "expired",
            UserStatus::OnHold => "on_hold",
            UserStatus::Unknown => "unknown",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "active" => UserStatus::Active,
            "disabled" => UserStatus::Disabled,
            "limited" => UserStatus::Limited,
            "expired" => UserStatus::Expired,
            "on_hold" => UserStatus::OnHold,
            _ => UserStatus::Unknown,
        }
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User body carried by a lifecycle event
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPayload {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub status: Option<UserStatus>,
    #[serde(default, deserialize_with = "de_stringish")]
    pub expire: Option<String>,
    #[serde(default)]
    pub data_limit: Option<i64>,
}

/// The panel admin that caused the event
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActorPayload {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub telegram_id: Option<i64>,
}

/// A single normalized webhook event
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookEvent {
    #[serde(default)]
    pub action: Option<EventAction>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub user: Option<UserPayload>,
    #[serde(default, rename = "by")]
    pub actor: Option<ActorPayload>,
    #[serde(default)]
    pub send_at: i64,
}

impl WebhookEvent {
    /// Telegram id of the causing admin, stringified for storage keys
    pub fn actor_telegram_id(&self) -> Option<String> {
        self.actor
            .as_ref()
            .and_then(|a| a.telegram_id)
            .map(|id| id.to_string())
    }

    pub fn actor_username(&self) -> &str {
        self.actor
            .as_ref()
            .and_then(|a| a.username.as_deref())
            .unwrap_or("unknown")
    }
}

/// Webhook request body: a batch of events, or one event auto-wrapped
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WebhookBody {
    Batch(Vec<WebhookEvent>),
    Single(WebhookEvent),
}

impl WebhookBody {
    pub fn into_events(self) -> Vec<WebhookEvent> {
        match self {
            WebhookBody::Batch(events) => events,
            WebhookBody::Single(event) => vec![event],
        }
    }
}

/// Accept both string and numeric timestamp representations
fn de_stringish<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_event_wrapped() {
        let body: WebhookBody = serde_json::from_str(
            r#"{"action": "user_created", "username": "alice", "send_at": 1700000000,
                "user": {"id": 1, "status": "active", "expire": "2025-01-01T00:00:00Z"},
                "by": {"id": 9, "username": "admin", "telegram_id": 4242}}"#,
        )
        .unwrap();

        let events = body.into_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, Some(EventAction::UserCreated));
        assert_eq!(events[0].actor_telegram_id().as_deref(), Some("4242"));
    }

    #[test]
    fn test_batch_body() {
        let body: WebhookBody = serde_json::from_str(
            r#"[{"action": "user_updated", "username": "bob", "user": {"status": "on_hold"}},
                {"action": "user_created", "username": "carol", "user": {"status": "active"}}]"#,
        )
        .unwrap();

        assert_eq!(body.into_events().len(), 2);
    }

    #[test]
    fn test_unknown_action_and_status() {
        let event: WebhookEvent = serde_json::from_str(
            r#"{"action": "user_deleted", "username": "dave", "user": {"status": "suspended"}}"#,
        )
        .unwrap();

        assert_eq!(event.action, Some(EventAction::Other));
        assert_eq!(event.user.unwrap().status, Some(UserStatus::Unknown));
    }

    #[test]
    fn test_numeric_expire_coerced() {
        let event: WebhookEvent = serde_json::from_str(
            r#"{"action": "user_updated", "username": "erin", "user": {"expire": 1700000000}}"#,
        )
        .unwrap();

        assert_eq!(event.user.unwrap().expire.as_deref(), Some("1700000000"));
    }

    #[test]
    fn test_missing_fields_deserialize() {
        let event: WebhookEvent = serde_json::from_str(r#"{"username": "frank"}"#).unwrap();
        assert!(event.action.is_none());
        assert!(event.user.is_none());
        assert_eq!(event.send_at, 0);
    }
}
