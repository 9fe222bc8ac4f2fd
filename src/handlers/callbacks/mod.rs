//! Callback query handlers module
//!
//! The interactive action dispatcher: decodes button tokens, drives the
//! ledger engine and edits the originating notification. The ledger write
//! always commits first; message cosmetics are best-effort and their
//! failure is reported to the actor as a soft notice.

use serde_json::json;
use teloxide::types::{CallbackQuery, InlineKeyboardMarkup, MaybeInaccessibleMessage};
use tracing::{info, warn};

use crate::models::callback::{CallbackAction, CallbackToken};
use crate::models::payment::PaymentStatus;
use crate::services::{AppContext, MessageRef, MAX_MESSAGE_CHARS};
use crate::utils::errors::Result;
use crate::utils::helpers::{format_timestamp, truncate_text};

/// The marker line prefix appended when a user lands on a settlement list
const SETTLEMENT_MARKER: &str = "➕ Added to settlement list";

/// Source message a button press originated from, when still accessible
struct CallbackSource {
    target: MessageRef,
    text: String,
    keyboard: Option<InlineKeyboardMarkup>,
}

/// Main callback query dispatcher
pub async fn handle_callback_query(query: CallbackQuery, ctx: AppContext) -> Result<()> {
    let actor_id = query.from.id.0.to_string();
    let actor_name = query.from.full_name();

    let Some(data) = query.data.as_deref() else {
        ctx.transport
            .answer_callback(&query.id, Some("❌ Empty action"))
            .await
            .ok();
        return Ok(());
    };

    // Malformed tokens are a hard decode error, rejected before any ledger call
    let token = match CallbackToken::parse(data) {
        Ok(token) => token,
        Err(e) => {
            warn!(actor_id = %actor_id, data = data, error = %e, "Rejecting malformed callback token");
            ctx.transport
                .answer_callback(&query.id, Some("❌ Invalid action token"))
                .await
                .ok();
            return Ok(());
        }
    };

    let source = extract_source(&query);

    info!(
        actor_id = %actor_id,
        action = %token.action,
        username = %token.username,
        "Processing callback action"
    );

    let outcome = match token.action {
        CallbackAction::Paid => {
            handle_payment_mark(&ctx, &query, &token, PaymentStatus::Paid, &actor_id, &actor_name, source)
                .await
        }
        CallbackAction::Unpaid => {
            handle_payment_mark(&ctx, &query, &token, PaymentStatus::Unpaid, &actor_id, &actor_name, source)
                .await
        }
        CallbackAction::AddSettlement => {
            handle_add_settlement(&ctx, &query, &token, &actor_id, &actor_name, source).await
        }
    };

    // The actor always gets a short acknowledgement, even on failure
    if let Err(e) = outcome {
        warn!(actor_id = %actor_id, error = %e, "Callback processing failed");
        ctx.transport
            .answer_callback(&query.id, Some("❌ Processing error"))
            .await
            .ok();
        return Err(e);
    }

    ctx.db
        .audit
        .append(
            &format!("callback_{}", token.action),
            Some(token.username.as_str()),
            Some(token.admin_telegram_id.as_str()),
            Some(actor_id.as_str()),
            Some(json!({
                "action": token.action.as_str(),
                "event_key": token.event_key.clone(),
            })),
        )
        .await?;

    Ok(())
}

/// Mark a username paid or unpaid and annotate the source message
async fn handle_payment_mark(
    ctx: &AppContext,
    query: &CallbackQuery,
    token: &CallbackToken,
    status: PaymentStatus,
    actor_id: &str,
    actor_name: &str,
    source: Option<CallbackSource>,
) -> Result<()> {
    let outcome = ctx.ledger.mark_payment(&token.username, status, actor_id).await?;

    if !outcome.is_applied() {
        ctx.transport
            .answer_callback(&query.id, Some(&format!("Already marked as {}", status)))
            .await
            .ok();
        return Ok(());
    }

    let Some(source) = source else {
        ctx.transport
            .answer_callback(&query.id, Some(&format!("{} marked ✅", status)))
            .await
            .ok();
        return Ok(());
    };

    let stamp = format_timestamp(chrono::Utc::now());
    let new_text = apply_payment_annotation(&source.text, status, actor_name, &stamp);
    let new_text = truncate_text(&new_text, MAX_MESSAGE_CHARS);

    match ctx
        .transport
        .edit_message(&source.target, &new_text, source.keyboard)
        .await
    {
        Ok(()) => {
            ctx.transport
                .answer_callback(&query.id, Some(&format!("{} marked ✅", status)))
                .await
                .ok();
        }
        Err(e) => {
            warn!(error = %e, "Failed to update message after payment mark");
            ctx.transport
                .answer_callback(&query.id, Some("Marked but error updating message"))
                .await
                .ok();
        }
    }

    Ok(())
}

/// Add a username to the pressing admin's settlement list
async fn handle_add_settlement(
    ctx: &AppContext,
    query: &CallbackQuery,
    token: &CallbackToken,
    actor_id: &str,
    actor_name: &str,
    source: Option<CallbackSource>,
) -> Result<()> {
    // Entries created via button press carry no price until separately set
    ctx.ledger
        .add_to_settlement(&token.username, &token.admin_telegram_id, None, actor_id)
        .await?;

    let Some(source) = source else {
        ctx.transport
            .answer_callback(&query.id, Some("Added to settlement list ✅"))
            .await
            .ok();
        return Ok(());
    };

    if source.text.contains(SETTLEMENT_MARKER) {
        ctx.transport
            .answer_callback(&query.id, Some("Already on the settlement list"))
            .await
            .ok();
        return Ok(());
    }

    let stamp = format_timestamp(chrono::Utc::now());
    let new_text = format!(
        "{}\n{} by {} at {}",
        source.text, SETTLEMENT_MARKER, actor_name, stamp
    );
    let new_text = truncate_text(&new_text, MAX_MESSAGE_CHARS);

    match ctx
        .transport
        .edit_message(&source.target, &new_text, source.keyboard)
        .await
    {
        Ok(()) => {
            ctx.transport
                .answer_callback(&query.id, Some("Added to settlement list ✅"))
                .await
                .ok();
        }
        Err(e) => {
            warn!(error = %e, "Failed to update message after settlement add");
            ctx.transport
                .answer_callback(&query.id, Some("Added but error updating message"))
                .await
                .ok();
        }
    }

    Ok(())
}

/// Pull the originating message out of the query, when Telegram still lets
/// us see it
fn extract_source(query: &CallbackQuery) -> Option<CallbackSource> {
    match query.message.as_ref()? {
        MaybeInaccessibleMessage::Regular(message) => {
            let text = message.text()?.to_string();
            Some(CallbackSource {
                target: MessageRef {
                    chat_id: message.chat.id.0,
                    message_id: message.id.0,
                },
                text,
                keyboard: message.reply_markup().cloned(),
            })
        }
        MaybeInaccessibleMessage::Inaccessible(_) => None,
    }
}

/// Replace any previous payment annotation with the new one.
///
/// Lines carrying an earlier Paid/Unpaid mark are stripped so repeated
/// flips do not stack annotations.
fn apply_payment_annotation(original: &str, status: PaymentStatus, actor: &str, stamp: &str) -> String {
    let kept: Vec<&str> = original
        .lines()
        .filter(|line| !line.contains("✅ Paid") && !line.contains("❌ Unpaid"))
        .collect();

    let emoji = match status {
        PaymentStatus::Paid => "✅",
        _ => "❌",
    };

    format!(
        "{}\n{} {} marked by {} at {}",
        kept.join("\n"),
        emoji,
        status,
        actor,
        stamp
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_annotation_appended() {
        let text = apply_payment_annotation("body line", PaymentStatus::Paid, "Boss", "2025-01-01");
        assert!(text.starts_with("body line\n"));
        assert!(text.contains("✅ Paid marked by Boss"));
    }

    #[test]
    fn test_payment_annotation_replaces_previous() {
        let original = "body line\n✅ Paid marked by Boss at 2025-01-01";
        let text = apply_payment_annotation(original, PaymentStatus::Unpaid, "Clerk", "2025-01-02");

        assert!(!text.contains("✅ Paid"));
        assert!(text.contains("❌ Unpaid marked by Clerk"));
        assert_eq!(text.matches("marked by").count(), 1);
    }
}
