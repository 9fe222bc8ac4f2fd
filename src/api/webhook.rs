//! Webhook endpoints
//!
//! `POST /webhook` receives panel lifecycle events (an array, or a single
//! object auto-wrapped). Events are processed sequentially; one event's
//! failure is logged and the rest of the batch continues. The response is
//! HTTP 200 with processed/total counts even on partial failures; only a
//! top-level body-parse failure yields 400.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use chrono::{Duration, Utc};
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::event::{
    ActorPayload, EventAction, UserPayload, UserStatus, WebhookBody, WebhookEvent,
};
use crate::services::AppContext;
use crate::utils::errors::Result;

/// Receive webhook notifications from the panel
pub async fn receive_webhook(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(response) = check_webhook_secret(&ctx, &headers) {
        return response;
    }

    let parsed: WebhookBody = match serde_json::from_slice(&body) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(error = %e, "Rejecting unparseable webhook body");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "status": "error",
                    "message": format!("Webhook processing failed: {}", e),
                })),
            )
                .into_response();
        }
    };

    let events = parsed.into_events();
    let request_id = Uuid::new_v4();
    info!(request_id = %request_id, total = events.len(), "Processing webhook events");

    let processed = process_batch(&ctx, &events, request_id).await;

    info!(
        request_id = %request_id,
        processed = processed,
        total = events.len(),
        "Webhook batch completed"
    );

    Json(json!({
        "status": "ok",
        "processed": processed,
        "total": events.len(),
    }))
    .into_response()
}

/// Test endpoint to verify the webhook URL is reachable and see sync state
pub async fn webhook_test(State(ctx): State<AppContext>) -> Response {
    let sync_enabled = match ctx.db.sync_flags.is_sync_complete().await {
        Ok(enabled) => enabled,
        Err(e) => return store_error_response(e),
    };
    let registered_admins = match ctx.db.admin_topics.count().await {
        Ok(count) => count,
        Err(e) => return store_error_response(e),
    };

    Json(json!({
        "status": "ok",
        "message": "Webhook endpoint is accessible",
        "sync_enabled": sync_enabled,
        "registered_admins": registered_admins,
        "webhook_url": "/webhook (POST)",
        "timestamp": Utc::now().to_rfc3339(),
    }))
    .into_response()
}

/// Simulate a webhook event for testing (non-production use only).
///
/// An empty body injects a synthetic default event.
pub async fn simulate_webhook(State(ctx): State<AppContext>, body: Bytes) -> Response {
    let events = if body.iter().all(u8::is_ascii_whitespace) {
        vec![default_simulated_event()]
    } else {
        match serde_json::from_slice::<WebhookBody>(&body) {
            Ok(parsed) => {
                let events = parsed.into_events();
                if events.is_empty() {
                    vec![default_simulated_event()]
                } else {
                    events
                }
            }
            Err(e) => {
                return Json(json!({
                    "status": "error",
                    "message": e.to_string(),
                }))
                .into_response();
            }
        }
    };

    let request_id = Uuid::new_v4();
    info!(request_id = %request_id, total = events.len(), "Simulating webhook events");

    let processed = process_batch(&ctx, &events, request_id).await;

    Json(json!({
        "status": "simulated",
        "processed": processed,
        "total": events.len(),
    }))
    .into_response()
}

/// Process a batch sequentially, isolating per-event failures
async fn process_batch(ctx: &AppContext, events: &[WebhookEvent], request_id: Uuid) -> usize {
    let mut processed = 0;

    for event in events {
        match process_event(ctx, event).await {
            Ok(true) => processed += 1,
            Ok(false) => {}
            Err(e) => {
                error!(
                    request_id = %request_id,
                    username = ?event.username,
                    error = %e,
                    "Error processing event"
                );
            }
        }
    }

    processed
}

/// Triage one event and forward sending decisions to the router.
///
/// Returns whether the event counted as processed (invalid events do not).
async fn process_event(ctx: &AppContext, event: &WebhookEvent) -> Result<bool> {
    let Some(decision) = ctx.triage.process_event(event).await? else {
        return Ok(false);
    };

    if !decision.send {
        return Ok(true);
    }

    let (Some(message), Some(event_key)) = (decision.message.as_deref(), decision.event_key.as_deref())
    else {
        return Ok(true);
    };

    match event.actor_telegram_id() {
        Some(admin_id) => {
            let username = event.username.as_deref().unwrap_or_default();
            ctx.router
                .route(&admin_id, event.actor_username(), message, username, event_key)
                .await;
        }
        None => {
            warn!(
                username = ?event.username,
                "Event actor has no Telegram id, notification cannot be routed"
            );
        }
    }

    Ok(true)
}

/// Enforce the shared webhook secret when one is configured
fn check_webhook_secret(ctx: &AppContext, headers: &HeaderMap) -> std::result::Result<(), Response> {
    let Some(expected) = ctx.settings.server.webhook_secret.as_deref() else {
        return Ok(());
    };

    let provided = headers
        .get("x-webhook-secret")
        .and_then(|value| value.to_str().ok());

    if provided != Some(expected) {
        warn!("Rejecting webhook request with missing or invalid secret");
        return Err((
            StatusCode::FORBIDDEN,
            Json(json!({
                "status": "error",
                "message": "Invalid webhook secret",
            })),
        )
            .into_response());
    }

    Ok(())
}

fn store_error_response(e: crate::utils::errors::PayBuddyError) -> Response {
    error!(error = %e, "Diagnostic endpoint failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "status": "error",
            "message": e.to_string(),
        })),
    )
        .into_response()
}

fn default_simulated_event() -> WebhookEvent {
    let now = Utc::now();
    WebhookEvent {
        action: Some(EventAction::UserCreated),
        username: Some("test_user".to_string()),
        user: Some(UserPayload {
            id: Some(999),
            username: Some("test_user".to_string()),
            status: Some(UserStatus::Active),
            expire: Some((now + Duration::days(30)).to_rfc3339()),
            data_limit: Some(10_737_418_240),
        }),
        actor: Some(ActorPayload {
            id: Some(1),
            username: Some("test_admin".to_string()),
            telegram_id: None,
        }),
        send_at: now.timestamp(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_simulated_event_shape() {
        let event = default_simulated_event();
        assert_eq!(event.username.as_deref(), Some("test_user"));
        assert!(event.user.is_some());
        assert!(event.actor_telegram_id().is_none());
    }
}
