//! Triage decision scenarios exercised through the public API

use chrono::Utc;

use PayBuddy::models::callback::{generate_event_key, CallbackToken, MAX_CALLBACK_DATA_BYTES};
use PayBuddy::models::event::{UserStatus, WebhookBody, WebhookEvent};
use PayBuddy::models::snapshot::UserSnapshot;
use PayBuddy::services::triage::{evaluate_update, validate_event, TriggerReason};

fn snapshot(username: &str, status: &str, expire: Option<&str>) -> UserSnapshot {
    UserSnapshot {
        username: username.to_string(),
        status: status.to_string(),
        expire: expire.map(str::to_string),
        updated_at: Utc::now(),
    }
}

#[test]
fn extension_of_ten_days_triggers_with_day_count() {
    let old = snapshot("bob", "active", Some("2025-02-01T00:00:00Z"));
    let reason = evaluate_update(&old, UserStatus::Active, Some("2025-02-11T00:00:00Z"));

    assert_eq!(reason, Some(TriggerReason::ExpireExtended { days: 10 }));
    assert_eq!(reason.unwrap().tag(), "expire_extended_10_days");
}

#[test]
fn hold_transition_triggers_even_below_extension_floor() {
    // Two days of extension is below the seven-day floor, but the hold
    // transition fires on its own
    let old = snapshot("carol", "active", Some("2025-02-01T00:00:00Z"));
    let reason = evaluate_update(&old, UserStatus::OnHold, Some("2025-02-03T00:00:00Z"));

    assert_eq!(reason, Some(TriggerReason::StatusToOnHold));
}

#[test]
fn extension_reason_wins_when_both_conditions_hold() {
    let old = snapshot("dave", "active", Some("2025-02-01T00:00:00Z"));
    let reason = evaluate_update(&old, UserStatus::OnHold, Some("2025-03-01T00:00:00Z"));

    assert!(matches!(reason, Some(TriggerReason::ExpireExtended { .. })));
}

#[test]
fn six_day_extension_stays_silent() {
    let old = snapshot("erin", "active", Some("2025-02-01T00:00:00Z"));
    let reason = evaluate_update(&old, UserStatus::Active, Some("2025-02-07T00:00:00Z"));

    assert_eq!(reason, None);
}

#[test]
fn hold_to_hold_does_not_retrigger() {
    let old = snapshot("frank", "on_hold", None);
    assert_eq!(evaluate_update(&old, UserStatus::OnHold, None), None);
}

#[test]
fn missing_username_fails_validation() {
    let batch: WebhookBody = serde_json::from_str(
        r#"[{"action": "user_created", "username": "alice", "user": {"status": "active"}},
            {"action": "user_created", "user": {"status": "active"}},
            {"action": "user_created", "username": "bob", "user": {"status": "active"}}]"#,
    )
    .unwrap();

    let events: Vec<WebhookEvent> = batch.into_events();
    let valid = events.iter().filter(|e| validate_event(e).is_some()).count();

    // One malformed event among two valid ones: 2 of 3 are processable
    assert_eq!(events.len(), 3);
    assert_eq!(valid, 2);
}

#[test]
fn event_keys_are_stable_and_fit_buttons() {
    let key = generate_event_key("created", "alice", 1700000000);
    assert_eq!(key, generate_event_key("created", "alice", 1700000000));

    let token = CallbackToken::new(
        PayBuddy::models::callback::CallbackAction::Paid,
        "alice",
        "123456789",
        key,
    );
    let encoded = token.encode();
    assert!(encoded.len() <= MAX_CALLBACK_DATA_BYTES);

    let decoded = CallbackToken::parse(&encoded).unwrap();
    assert_eq!(decoded.username, "alice");
}
