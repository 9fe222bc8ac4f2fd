//! Message handlers module
//!
//! Routes plain text messages into the active setup dialog, if any.

use teloxide::{prelude::*, types::ParseMode, Bot};
use tracing::{debug, info};

use crate::services::AppContext;
use crate::state::{parse_destination, SetupState};
use crate::utils::errors::Result;

/// Handle an incoming text message.
///
/// Messages outside private chats, or from users without an active setup
/// session, are ignored.
pub async fn handle_message(bot: Bot, msg: Message, ctx: AppContext) -> Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let user_id = user.id.0 as i64;

    if !msg.chat.id.is_user() {
        return Ok(());
    }

    let Some(text) = msg.text() else {
        return Ok(());
    };

    let Some(mut session) = ctx.sessions.load_session(user_id).await? else {
        debug!(user_id = user_id, "No active dialog, ignoring message");
        return Ok(());
    };

    match session.state.clone() {
        SetupState::AwaitingAdminId => match session.submit_admin_id(text) {
            Ok(()) => {
                ctx.sessions.save_session(&session).await?;

                if let SetupState::AwaitingDestination { admin_telegram_id } = &session.state {
                    let reply = format!(
                        "✅ Admin Telegram ID: <code>{}</code>\n\n\
                         Now enter the destination Chat ID, optionally followed by \
                         a Topic ID:\n\n\
                         <b>How to get a Chat ID:</b>\n\
                         • Add the bot to the group\n\
                         • Use @getidsbot to read the Chat ID",
                        admin_telegram_id
                    );
                    bot.send_message(msg.chat.id, reply)
                        .parse_mode(ParseMode::Html)
                        .await?;
                }
            }
            Err(e) => {
                bot.send_message(msg.chat.id, format!("❌ {}", e)).await?;
            }
        },
        SetupState::AwaitingDestination { admin_telegram_id } => {
            match parse_destination(text) {
                Ok((chat_id, topic_id)) => {
                    let topic_string = topic_id.map(|t| t.to_string());
                    ctx.db
                        .admin_topics
                        .upsert(
                            &admin_telegram_id,
                            Some("unknown"),
                            &chat_id.to_string(),
                            topic_string.as_deref(),
                        )
                        .await?;
                    ctx.sessions.delete_session(user_id).await?;

                    let mut reply = format!(
                        "✅ <b>Settings saved</b>\n\n\
                         👤 Admin Telegram ID: <code>{}</code>\n\
                         💬 Chat ID: <code>{}</code>\n",
                        admin_telegram_id, chat_id
                    );
                    match topic_id {
                        Some(topic) => reply.push_str(&format!("🗂 Topic ID: <code>{}</code>", topic)),
                        None => reply.push_str("🗂 Topic: General (no topic)"),
                    }
                    reply.push_str("\n\n🎯 Notifications for this admin will now go here");

                    bot.send_message(msg.chat.id, reply)
                        .parse_mode(ParseMode::Html)
                        .await?;

                    info!(
                        admin_id = %admin_telegram_id,
                        chat_id = chat_id,
                        topic_id = ?topic_id,
                        "Admin destination configured via dialog"
                    );
                }
                Err(e) => {
                    // Session stays alive so the operator can retry
                    bot.send_message(msg.chat.id, format!("❌ {}", e)).await?;
                }
            }
        }
    }

    Ok(())
}
