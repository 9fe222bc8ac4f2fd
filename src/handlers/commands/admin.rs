//! Administrative command handlers
//!
//! Operator-only commands: roster sync, destination setup, registry listing
//! and system statistics.

use teloxide::{prelude::*, types::ParseMode, Bot};
use tracing::{error, info};

use crate::database::repositories::{INITIAL_SYNC_COMPLETE, LAST_SYNC};
use crate::services::AppContext;
use crate::state::SetupSession;
use crate::utils::errors::Result;
use crate::utils::helpers::{format_timestamp, parse_datetime};

/// Reply when a non-operator invokes a gated command; returns whether the
/// caller may proceed
pub async fn require_operator(bot: &Bot, msg: &Message, ctx: &AppContext) -> Result<bool> {
    let user_id = msg.from.as_ref().map(|u| u.id.0 as i64).unwrap_or_default();
    if ctx.is_operator(user_id) {
        return Ok(true);
    }

    bot.send_message(msg.chat.id, "⛔ This command is restricted to operators")
        .await?;
    Ok(false)
}

/// Handle the /sync command - reconcile the admin roster from the panel
pub async fn handle_sync(bot: Bot, msg: Message, ctx: AppContext) -> Result<()> {
    if !require_operator(&bot, &msg, &ctx).await? {
        return Ok(());
    }

    if !ctx.sync.is_configured() {
        bot.send_message(
            msg.chat.id,
            "⚠️ Panel API is not configured - admin sync is disabled",
        )
        .await?;
        return Ok(());
    }

    bot.send_message(msg.chat.id, "🔄 Starting admin sync...").await?;

    match ctx.sync.sync_from_api().await {
        Ok(report) => {
            let summary = format!(
                "✅ <b>Sync completed</b>\n\n\
                 👥 Created: {}\n\
                 ✏️ Updated: {}\n\
                 ⏭ Skipped (no Telegram ID): {}\n\
                 ⚠️ Errors: {}\n\n\
                 The bot is now ready to process user_updated events",
                report.created, report.updated, report.skipped, report.errors
            );
            bot.send_message(msg.chat.id, summary)
                .parse_mode(ParseMode::Html)
                .await?;
            info!("Manual sync completed");
        }
        Err(e) => {
            error!(error = %e, "Sync failed");
            bot.send_message(msg.chat.id, format!("❌ Sync error: {}", e))
                .await?;
        }
    }

    Ok(())
}

/// Handle the /set_admin_topic command - start the setup dialog
pub async fn handle_set_admin_topic(bot: Bot, msg: Message, ctx: AppContext) -> Result<()> {
    if !require_operator(&bot, &msg, &ctx).await? {
        return Ok(());
    }

    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    let session = SetupSession::new(user.id.0 as i64);
    ctx.sessions.save_session(&session).await?;

    let text = "⚙️ <b>Admin destination setup</b>\n\n\
        Please enter the admin's Telegram ID:\n\n\
        <b>Notes:</b>\n\
        • Use @userinfobot to find a Telegram ID\n\
        • The ID is numeric (e.g. 123456789)\n\
        • Send /cancel to abandon the dialog";

    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .await?;

    Ok(())
}

/// Handle the /cancel command - abandon the setup dialog
pub async fn handle_cancel(bot: Bot, msg: Message, ctx: AppContext) -> Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    ctx.sessions.delete_session(user.id.0 as i64).await?;
    bot.send_message(msg.chat.id, "✅ Dialog cancelled").await?;
    Ok(())
}

/// Handle the /clear_admin command - explicit clear of a destination mapping
pub async fn handle_clear_admin(
    bot: Bot,
    msg: Message,
    ctx: AppContext,
    admin_id: String,
) -> Result<()> {
    if !require_operator(&bot, &msg, &ctx).await? {
        return Ok(());
    }

    let admin_id = admin_id.trim().to_string();
    if admin_id.is_empty() || !admin_id.chars().all(|c| c.is_ascii_digit()) {
        bot.send_message(msg.chat.id, "Usage: /clear_admin <telegram_id>").await?;
        return Ok(());
    }

    match ctx.db.admin_topics.get(&admin_id).await? {
        Some(_) => {
            ctx.db.admin_topics.delete(&admin_id).await?;
            info!(admin_id = %admin_id, "Admin destination cleared");
            bot.send_message(
                msg.chat.id,
                format!("✅ Destination mapping for <code>{}</code> cleared", admin_id),
            )
            .parse_mode(ParseMode::Html)
            .await?;
        }
        None => {
            bot.send_message(msg.chat.id, "📝 No mapping found for that admin")
                .await?;
        }
    }

    Ok(())
}

/// Handle the /list_admins command
pub async fn handle_list_admins(bot: Bot, msg: Message, ctx: AppContext) -> Result<()> {
    let admins = ctx.db.admin_topics.list_all().await?;

    if admins.is_empty() {
        bot.send_message(msg.chat.id, "📝 No admins have been configured")
            .await?;
        return Ok(());
    }

    let mut text = String::from("👥 <b>Configured admins:</b>\n\n");
    for admin in &admins {
        text.push_str(&format!(
            "👤 <b>{}</b>\n🆔 TG ID: <code>{}</code>\n",
            admin.admin_username.as_deref().unwrap_or("unknown"),
            admin.admin_telegram_id
        ));

        if admin.has_destination() {
            text.push_str(&format!("💬 Chat: <code>{}</code>\n", admin.chat_id));
        } else {
            text.push_str("💬 Chat: not configured\n");
        }

        match &admin.topic_id {
            Some(topic) => text.push_str(&format!("🗂 Topic: <code>{}</code>\n", topic)),
            None => text.push_str("🗂 Topic: General\n"),
        }
        text.push_str("─────────────\n");
    }

    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .await?;

    Ok(())
}

/// Handle the /stats command
pub async fn handle_stats(bot: Bot, msg: Message, ctx: AppContext) -> Result<()> {
    let sync_complete = ctx.db.sync_flags.get(INITIAL_SYNC_COMPLETE).await?;
    let last_sync = ctx.db.sync_flags.get(LAST_SYNC).await?;
    let admin_count = ctx.db.admin_topics.count().await?;
    let audit_count = ctx.db.audit.count().await?;

    let sync_done = sync_complete.as_deref() == Some("true");
    let sync_emoji = if sync_done { "✅" } else { "❌" };
    let sync_text = if sync_done { "Complete" } else { "Incomplete" };

    let last_sync_text = last_sync
        .as_deref()
        .and_then(|raw| parse_datetime(Some(raw)))
        .map(format_timestamp)
        .unwrap_or_else(|| "Never".to_string());

    let panel_text = if ctx.sync.is_configured() {
        "✅ Configured"
    } else {
        "⚠️ Not configured"
    };

    let text = format!(
        "📊 <b>System statistics</b>\n\n\
         🔄 <b>Sync status:</b> {sync_emoji} {sync_text}\n\
         🕐 <b>Last sync:</b> {last_sync_text}\n\
         👥 <b>Configured admins:</b> {admin_count}\n\
         🧾 <b>Audit entries:</b> {audit_count}\n\n\
         🤖 <b>Bot status:</b> ✅ Active\n\
         📡 <b>Panel API:</b> {panel_text}"
    );

    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .await?;

    Ok(())
}
