//! Event triage engine
//!
//! Consumes normalized panel lifecycle events, diffs them against the last
//! known snapshot, and decides whether a notification must go out.
//! `user_created` always notifies; `user_updated` notifies only when the
//! expiry moved forward by at least the threshold or the account went on
//! hold. Every event is recorded in the audit log before any decision is
//! made, and the snapshot is overwritten regardless of the outcome.

use serde_json::json;
use tracing::{info, warn};

use crate::database::DatabaseService;
use crate::models::callback::generate_event_key;
use crate::models::event::{EventAction, UserPayload, UserStatus, WebhookEvent};
use crate::models::snapshot::UserSnapshot;
use crate::utils::errors::Result;
use crate::utils::helpers::{days_between, format_expire, format_timestamp, unix_to_datetime};
use crate::utils::logging::log_triage_decision;

/// Minimum forward movement of the expiry, in whole days, for the
/// extension trigger to fire
pub const EXTENSION_THRESHOLD_DAYS: i64 = 7;

/// Why an update notification fires
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerReason {
    ExpireExtended { days: i64 },
    StatusToOnHold,
}

impl TriggerReason {
    pub fn tag(&self) -> String {
        match self {
            TriggerReason::ExpireExtended { days } => format!("expire_extended_{}_days", days),
            TriggerReason::StatusToOnHold => "status_to_on_hold".to_string(),
        }
    }
}

/// Outcome of triaging one event
#[derive(Debug, Clone)]
pub struct TriageDecision {
    pub send: bool,
    pub reason: Option<String>,
    pub message: Option<String>,
    pub event_key: Option<String>,
}

impl TriageDecision {
    fn skip(reason: &str) -> Self {
        Self {
            send: false,
            reason: Some(reason.to_string()),
            message: None,
            event_key: None,
        }
    }

    fn notify(reason: String, message: String, event_key: String) -> Self {
        Self {
            send: true,
            reason: Some(reason),
            message: Some(message),
            event_key: Some(event_key),
        }
    }
}

/// Extract the fields every processable event must carry.
///
/// Returns `None` when action, username or the user body is missing.
pub fn validate_event(event: &WebhookEvent) -> Option<(EventAction, &str, &UserPayload)> {
    let action = event.action?;
    let username = event.username.as_deref().filter(|u| !u.is_empty())?;
    let user = event.user.as_ref()?;
    Some((action, username, user))
}

/// Evaluate the update triggers against the previous snapshot.
///
/// The expire-extension trigger is evaluated first and returns immediately,
/// so its reason wins when both conditions hold.
pub fn evaluate_update(
    old: &UserSnapshot,
    new_status: UserStatus,
    new_expire: Option<&str>,
) -> Option<TriggerReason> {
    if let Some(days) = days_between(old.expire.as_deref(), new_expire) {
        if days >= EXTENSION_THRESHOLD_DAYS {
            return Some(TriggerReason::ExpireExtended { days });
        }
    }

    if old.status() != UserStatus::OnHold && new_status == UserStatus::OnHold {
        return Some(TriggerReason::StatusToOnHold);
    }

    None
}

/// The triage engine itself; stateless apart from the store handle
#[derive(Debug, Clone)]
pub struct TriageEngine {
    db: DatabaseService,
}

impl TriageEngine {
    pub fn new(db: DatabaseService) -> Self {
        Self { db }
    }

    /// Process a single webhook event.
    ///
    /// Returns `Ok(None)` when the event fails validation (audited, dropped,
    /// never fatal to the surrounding batch) and `Ok(Some(decision))`
    /// otherwise. Store failures propagate and abort this event only.
    pub async fn process_event(&self, event: &WebhookEvent) -> Result<Option<TriageDecision>> {
        // Durably record receipt before any triage decision
        let payload = serde_json::to_value(event).ok();
        self.db
            .audit
            .append(
                "webhook_received",
                event.username.as_deref(),
                event.actor_telegram_id().as_deref(),
                None,
                payload,
            )
            .await?;

        let Some((action, username, user)) = validate_event(event) else {
            warn!("Invalid event data: missing required fields");
            return Ok(None);
        };

        let decision = match action {
            EventAction::UserCreated => self.handle_user_created(event, username, user).await?,
            EventAction::UserUpdated => {
                if !self.db.sync_flags.is_sync_complete().await? {
                    info!(username = username, "Skipping user_updated - initial sync not complete");
                    TriageDecision::skip("sync_incomplete")
                } else {
                    self.handle_user_updated(event, username, user).await?
                }
            }
            EventAction::Other => {
                info!(username = username, "Ignoring unsupported action");
                TriageDecision::skip("unsupported_action")
            }
        };

        self.db
            .audit
            .append(
                "triage_decision",
                Some(username),
                event.actor_telegram_id().as_deref(),
                None,
                Some(json!({
                    "action": action.as_str(),
                    "send": decision.send,
                    "reason": decision.reason.clone(),
                })),
            )
            .await?;

        log_triage_decision(username, action.as_str(), decision.send, decision.reason.as_deref());
        Ok(Some(decision))
    }

    /// user_created always notifies; no prior snapshot is consulted
    async fn handle_user_created(
        &self,
        event: &WebhookEvent,
        username: &str,
        user: &UserPayload,
    ) -> Result<TriageDecision> {
        let status = user.status.unwrap_or(UserStatus::Unknown);
        self.db
            .snapshots
            .upsert(username, status.as_str(), user.expire.as_deref())
            .await?;

        let message = build_created_message(event, username, user);
        let event_key = generate_event_key(EventAction::UserCreated.key_tag(), username, event.send_at);

        Ok(TriageDecision::notify(
            "user_created".to_string(),
            message,
            event_key,
        ))
    }

    /// user_updated notifies only when a trigger fires; the snapshot is
    /// overwritten either way
    async fn handle_user_updated(
        &self,
        event: &WebhookEvent,
        username: &str,
        user: &UserPayload,
    ) -> Result<TriageDecision> {
        let new_status = user.status.unwrap_or(UserStatus::Unknown);
        let new_expire = user.expire.as_deref();

        let Some(old) = self.db.snapshots.get(username).await? else {
            // First sighting establishes the baseline without notifying
            info!(username = username, "No snapshot found, saving baseline and skipping");
            self.db
                .snapshots
                .upsert(username, new_status.as_str(), new_expire)
                .await?;
            return Ok(TriageDecision::skip("baseline_established"));
        };

        let trigger = evaluate_update(&old, new_status, new_expire);

        self.db
            .snapshots
            .upsert(username, new_status.as_str(), new_expire)
            .await?;

        match trigger {
            Some(reason) => {
                let message = build_updated_message(event, username, user, &old, &reason);
                let event_key =
                    generate_event_key(EventAction::UserUpdated.key_tag(), username, event.send_at);
                Ok(TriageDecision::notify(reason.tag(), message, event_key))
            }
            None => Ok(TriageDecision::skip("no_trigger")),
        }
    }
}

/// Format the notification for a freshly created account
pub fn build_created_message(event: &WebhookEvent, username: &str, user: &UserPayload) -> String {
    let user_id = user
        .id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let status = user.status.unwrap_or(UserStatus::Unknown);
    let data_limit = match user.data_limit {
        Some(bytes) if bytes > 0 => format!("{:.1} GB", bytes as f64 / 1024f64.powi(3)),
        _ => "Unlimited".to_string(),
    };
    let expire = format_expire(user.expire.as_deref());
    let created = format_timestamp(unix_to_datetime(event.send_at));
    let admin = event.actor_username();
    let admin_tg = event
        .actor_telegram_id()
        .unwrap_or_else(|| "unknown".to_string());

    format!(
        "🧾 <b>Accounting | user_created</b>\n\n\
         👤 <b>User:</b> <code>{username}</code> (id: {user_id})\n\
         👮 <b>Admin:</b> {admin} (tg id: {admin_tg})\n\n\
         <b>Details:</b>\n\
         ⚡ Status: {status}\n\
         📊 Data limit: {data_limit}\n\
         📅 Expire: {expire}\n\
         🕐 Created: {created}"
    )
}

/// Format the notification for an update that fired a trigger
pub fn build_updated_message(
    event: &WebhookEvent,
    username: &str,
    user: &UserPayload,
    old: &UserSnapshot,
    reason: &TriggerReason,
) -> String {
    let user_id = user
        .id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let new_status = user.status.unwrap_or(UserStatus::Unknown);
    let new_expire = format_expire(user.expire.as_deref());
    let updated = format_timestamp(unix_to_datetime(event.send_at));
    let admin = event.actor_username();
    let admin_tg = event
        .actor_telegram_id()
        .unwrap_or_else(|| "unknown".to_string());

    let mut message = format!(
        "🧾 <b>Accounting | user_updated</b>\n\n\
         👤 <b>User:</b> <code>{username}</code> (id: {user_id})\n\
         👮 <b>Admin:</b> {admin} (tg id: {admin_tg})\n\n\
         <b>Details:</b>\n\
         ⚡ Status: {new_status}\n\
         📅 Expire: {new_expire}\n\
         🕐 Updated: {updated}"
    );

    match reason {
        TriggerReason::ExpireExtended { days } => {
            let old_expire = format_expire(old.expire.as_deref());
            message.push_str(&format!(
                "\n\n🔄 <b>Expiry change:</b>\n\
                 📅 Before: {old_expire}\n\
                 📅 After: {new_expire}\n\
                 ⬆️ Extended: +{days} days"
            ));
        }
        TriggerReason::StatusToOnHold => {
            message.push_str(&format!(
                "\n\n🔄 <b>Status change:</b>\n\
                 ⚡ Before: {}\n\
                 ⚡ After: {new_status}",
                old.status
            ));
        }
    }

    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn snapshot(status: &str, expire: Option<&str>) -> UserSnapshot {
        UserSnapshot {
            username: "bob".to_string(),
            status: status.to_string(),
            expire: expire.map(str::to_string),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_extension_trigger_fires_at_threshold() {
        let old = snapshot("active", Some("2025-01-01T00:00:00Z"));
        let reason = evaluate_update(&old, UserStatus::Active, Some("2025-01-08T00:00:00Z"));
        assert_eq!(reason, Some(TriggerReason::ExpireExtended { days: 7 }));
    }

    #[test]
    fn test_extension_trigger_reports_days() {
        let old = snapshot("active", Some("2025-01-01T00:00:00Z"));
        let reason = evaluate_update(&old, UserStatus::Active, Some("2025-01-11T00:00:00Z"));
        assert_eq!(reason.unwrap().tag(), "expire_extended_10_days");
    }

    #[test]
    fn test_below_threshold_is_silent() {
        let old = snapshot("active", Some("2025-01-01T00:00:00Z"));
        let reason = evaluate_update(&old, UserStatus::Active, Some("2025-01-07T23:00:00Z"));
        assert_eq!(reason, None);
    }

    #[test]
    fn test_hold_trigger_fires_despite_short_extension() {
        let old = snapshot("active", Some("2025-01-01T00:00:00Z"));
        let reason = evaluate_update(&old, UserStatus::OnHold, Some("2025-01-03T00:00:00Z"));
        assert_eq!(reason, Some(TriggerReason::StatusToOnHold));
    }

    #[test]
    fn test_extension_wins_when_both_fire() {
        let old = snapshot("active", Some("2025-01-01T00:00:00Z"));
        let reason = evaluate_update(&old, UserStatus::OnHold, Some("2025-01-20T00:00:00Z"));
        assert_eq!(reason, Some(TriggerReason::ExpireExtended { days: 19 }));
    }

    #[test]
    fn test_already_on_hold_does_not_retrigger() {
        let old = snapshot("on_hold", None);
        let reason = evaluate_update(&old, UserStatus::OnHold, None);
        assert_eq!(reason, None);
    }

    #[test]
    fn test_unparseable_expire_disables_extension() {
        let old = snapshot("active", Some("garbage"));
        let reason = evaluate_update(&old, UserStatus::Active, Some("2025-06-01T00:00:00Z"));
        assert_eq!(reason, None);
    }

    #[test]
    fn test_validate_event_missing_fields() {
        let mut event = WebhookEvent::default();
        assert!(validate_event(&event).is_none());

        event.action = Some(EventAction::UserCreated);
        event.username = Some("alice".to_string());
        assert!(validate_event(&event).is_none());

        event.user = Some(UserPayload::default());
        assert!(validate_event(&event).is_some());
    }

    #[test]
    fn test_created_message_content() {
        let event: WebhookEvent = serde_json::from_str(
            r#"{"action": "user_created", "username": "alice", "send_at": 1700000000,
                "user": {"id": 7, "status": "active", "expire": "2025-06-01T00:00:00Z",
                         "data_limit": 10737418240},
                "by": {"username": "boss", "telegram_id": 4242}}"#,
        )
        .unwrap();

        let user = event.user.clone().unwrap();
        let message = build_created_message(&event, "alice", &user);

        assert!(message.contains("user_created"));
        assert!(message.contains("<code>alice</code>"));
        assert!(message.contains("boss"));
        assert!(message.contains("10.0 GB"));
    }

    #[test]
    fn test_updated_message_carries_trigger_block() {
        let event: WebhookEvent = serde_json::from_str(
            r#"{"action": "user_updated", "username": "bob", "send_at": 1700000000,
                "user": {"id": 8, "status": "active", "expire": "2025-06-11T00:00:00Z"},
                "by": {"username": "boss", "telegram_id": 4242}}"#,
        )
        .unwrap();

        let user = event.user.clone().unwrap();
        let old = snapshot("active", Some("2025-06-01T00:00:00Z"));
        let message = build_updated_message(
            &event,
            "bob",
            &user,
            &old,
            &TriggerReason::ExpireExtended { days: 10 },
        );

        assert!(message.contains("Expiry change"));
        assert!(message.contains("+10 days"));
    }
}
