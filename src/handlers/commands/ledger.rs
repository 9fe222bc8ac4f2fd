//! Ledger command handlers
//!
//! Settlement listing/checkout, fallback prices and payment dismissal.

use serde_json::json;
use teloxide::{prelude::*, types::ParseMode, Bot};
use tracing::info;

use crate::services::{AppContext, MarkOutcome};
use crate::utils::errors::Result;

use super::admin::require_operator;

/// Resolve which admin a settlement command targets: an explicit argument,
/// or the invoking user themselves
fn target_admin_id(arg: &str, msg: &Message) -> Option<String> {
    let trimmed = arg.trim();
    if !trimmed.is_empty() {
        if trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Some(trimmed.to_string());
        }
        return None;
    }
    msg.from.as_ref().map(|u| u.id.0.to_string())
}

/// Handle the /settlement command - show the active list and its total
pub async fn handle_settlement(bot: Bot, msg: Message, ctx: AppContext, arg: String) -> Result<()> {
    let Some(admin_id) = target_admin_id(&arg, &msg) else {
        bot.send_message(msg.chat.id, "❌ Admin ID must be numeric").await?;
        return Ok(());
    };

    let entries = ctx.ledger.list_settlement(&admin_id).await?;
    if entries.is_empty() {
        bot.send_message(msg.chat.id, "📝 Settlement list is empty").await?;
        return Ok(());
    }

    let totals = ctx.ledger.compute_total(&admin_id).await?;

    let mut text = format!(
        "🧾 <b>Settlement list for admin <code>{}</code></b>\n\n",
        admin_id
    );
    for entry in &entries {
        match &entry.price {
            Some(price) => text.push_str(&format!("• <code>{}</code>: {}\n", entry.username, price)),
            None => text.push_str(&format!("• <code>{}</code>\n", entry.username)),
        }
    }
    text.push_str(&format!(
        "\n💰 <b>Total:</b> {:.2} ({} priced, {} without price)",
        totals.total, totals.items_with_price, totals.items_without_price
    ));

    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .await?;

    Ok(())
}

/// Handle the /checkout command - flip all active entries to checked out
pub async fn handle_checkout(bot: Bot, msg: Message, ctx: AppContext, arg: String) -> Result<()> {
    if !require_operator(&bot, &msg, &ctx).await? {
        return Ok(());
    }

    let Some(admin_id) = target_admin_id(&arg, &msg) else {
        bot.send_message(msg.chat.id, "❌ Admin ID must be numeric").await?;
        return Ok(());
    };

    let actor_id = msg
        .from
        .as_ref()
        .map(|u| u.id.0.to_string())
        .unwrap_or_default();

    let affected = ctx.ledger.checkout(&admin_id, &actor_id).await?;

    ctx.db
        .audit
        .append(
            "command_checkout",
            None,
            Some(admin_id.as_str()),
            Some(actor_id.as_str()),
            Some(json!({ "entries": affected })),
        )
        .await?;

    if affected == 0 {
        bot.send_message(msg.chat.id, "📝 No active entries to check out").await?;
    } else {
        bot.send_message(
            msg.chat.id,
            format!("✅ Checked out {} settlement entries", affected),
        )
        .await?;
    }

    Ok(())
}

/// Handle the /setprice command - configure a fallback price for a user
pub async fn handle_set_price(
    bot: Bot,
    msg: Message,
    ctx: AppContext,
    username: String,
    price: String,
) -> Result<()> {
    if !require_operator(&bot, &msg, &ctx).await? {
        return Ok(());
    }

    if username.is_empty() {
        bot.send_message(msg.chat.id, "Usage: /set_price <username> <price>").await?;
        return Ok(());
    }

    match price.trim().parse::<f64>() {
        Ok(value) if value > 0.0 => {}
        _ => {
            bot.send_message(msg.chat.id, "❌ Price must be a positive number").await?;
            return Ok(());
        }
    }

    let actor_id = msg
        .from
        .as_ref()
        .map(|u| u.id.0.to_string())
        .unwrap_or_default();

    let previous = ctx.db.prices.get(&username).await?;
    let record = ctx.db.prices.set(&username, price.trim(), &actor_id).await?;

    ctx.db
        .audit
        .append(
            "command_setprice",
            Some(username.as_str()),
            None,
            Some(actor_id.as_str()),
            Some(json!({ "price": record.price.clone() })),
        )
        .await?;

    info!(username = %username, price = %record.price, "User price configured");

    let reply = match previous {
        Some(old) if old.price != record.price => format!(
            "✅ Price for <code>{}</code> updated from {} to {}",
            username, old.price, record.price
        ),
        _ => format!("✅ Price for <code>{}</code> set to {}", username, record.price),
    };

    bot.send_message(msg.chat.id, reply)
        .parse_mode(ParseMode::Html)
        .await?;

    Ok(())
}

/// Handle the /dismiss command - drop a user from payment tracking
pub async fn handle_dismiss(bot: Bot, msg: Message, ctx: AppContext, username: String) -> Result<()> {
    if !require_operator(&bot, &msg, &ctx).await? {
        return Ok(());
    }

    if username.is_empty() {
        bot.send_message(msg.chat.id, "Usage: /dismiss <username>").await?;
        return Ok(());
    }

    let actor_id = msg
        .from
        .as_ref()
        .map(|u| u.id.0.to_string())
        .unwrap_or_default();

    let outcome = ctx.ledger.dismiss(&username, &actor_id).await?;

    ctx.db
        .audit
        .append(
            "command_dismiss",
            Some(username.as_str()),
            None,
            Some(actor_id.as_str()),
            None,
        )
        .await?;

    let reply = match outcome {
        MarkOutcome::Applied(_) => format!("✅ <code>{}</code> dismissed", username),
        MarkOutcome::AlreadyMarked => format!("ℹ️ <code>{}</code> is already dismissed", username),
    };

    bot.send_message(msg.chat.id, reply)
        .parse_mode(ParseMode::Html)
        .await?;

    Ok(())
}
