//! Start command handler

use teloxide::{prelude::*, types::ParseMode, Bot};
use tracing::debug;

use crate::utils::errors::Result;

/// Handle the /start command
pub async fn handle_start(bot: Bot, msg: Message) -> Result<()> {
    debug!(chat_id = ?msg.chat.id, "Handling /start command");

    let welcome_text = "🤖 <b>PayBuddy activated</b>\n\n\
        This bot relays panel account events into per-admin topics and tracks \
        payment bookkeeping.\n\n\
        <b>Available commands:</b>\n\
        /help - Usage guide\n\
        /sync - Initial admin sync from the panel\n\
        /set_admin_topic - Configure an admin's destination\n\
        /list_admins - List configured admins\n\
        /settlement - Show a settlement list and total\n\
        /stats - System statistics";

    bot.send_message(msg.chat.id, welcome_text)
        .parse_mode(ParseMode::Html)
        .await?;

    Ok(())
}
