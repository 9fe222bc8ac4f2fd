//! Help command handler

use teloxide::{prelude::*, types::ParseMode, Bot};

use crate::utils::errors::Result;

/// Handle the /help command
pub async fn handle_help(bot: Bot, msg: Message) -> Result<()> {
    let help_text = "📖 <b>Usage guide</b>\n\n\
        <b>🔧 Settings:</b>\n\
        /set_admin_topic - Set a dedicated destination for an admin\n\
        /list_admins - View configured admins and their topics\n\
        /clear_admin &lt;telegram_id&gt; - Clear an admin's destination\n\
        /cancel - Abandon the current setup dialog\n\n\
        <b>📊 Operations:</b>\n\
        /sync - Initial sync of the admin roster from the panel API\n\
        /settlement [admin_id] - Show the active settlement list and total\n\
        /checkout [admin_id] - Check out all active settlement entries\n\
        /set_price &lt;username&gt; &lt;price&gt; - Configure a fallback price\n\
        /dismiss &lt;username&gt; - Dismiss a user from payment tracking\n\
        /stats - View system status and statistics\n\n\
        <b>🎯 How it works:</b>\n\
        1. Run /sync once so update events become eligible\n\
        2. Configure destinations with /set_admin_topic (or let the bot \
        auto-provision topics on first contact)\n\
        3. Webhook events are triaged and routed automatically\n\n\
        <b>🔔 Notification conditions:</b>\n\
        • user_created: always\n\
        • user_updated: only when the expiry grows by ≥7 days or the status \
        changes to on_hold";

    bot.send_message(msg.chat.id, help_text)
        .parse_mode(ParseMode::Html)
        .await?;

    Ok(())
}
