//! Chat transport capability
//!
//! The rest of the application talks to Telegram through the `ChatTransport`
//! trait so routing and sync logic stay independent of the concrete client.
//! `TelegramTransport` is the teloxide-backed implementation.

use async_trait::async_trait;
use teloxide::{
    payloads::{AnswerCallbackQuerySetters, EditMessageTextSetters, SendMessageSetters},
    prelude::Requester,
    types::{ChatId, InlineKeyboardMarkup, MessageId, ParseMode, Rgb, ThreadId},
    Bot,
};
use tracing::debug;

use crate::utils::errors::Result;

/// Handle to a message this bot has sent, used for later edits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRef {
    pub chat_id: i64,
    pub message_id: i32,
}

/// Outbound messaging capability consumed by the router and the ledger flow
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send an HTML message to a chat, optionally into a forum topic and
    /// optionally carrying an inline keyboard
    async fn send_message(
        &self,
        chat_id: i64,
        topic_id: Option<i64>,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<MessageRef>;

    /// Replace the text (and keyboard) of a previously sent message
    async fn edit_message(
        &self,
        target: &MessageRef,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<()>;

    /// Create a forum topic under a parent chat; fails when the chat has no
    /// forum support or the bot lacks the manage-topics permission
    async fn create_topic(&self, chat_id: i64, title: &str) -> Result<i64>;

    /// Acknowledge a button press with a short notice
    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()>;
}

/// teloxide-backed transport
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send_message(
        &self,
        chat_id: i64,
        topic_id: Option<i64>,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<MessageRef> {
        let mut request = self
            .bot
            .send_message(ChatId(chat_id), text)
            .parse_mode(ParseMode::Html);

        if let Some(topic) = topic_id {
            request = request.message_thread_id(ThreadId(MessageId(topic as i32)));
        }

        if let Some(markup) = keyboard {
            request = request.reply_markup(markup);
        }

        let message = request.await?;
        debug!(chat_id = chat_id, topic_id = ?topic_id, message_id = message.id.0, "Message sent");

        Ok(MessageRef {
            chat_id,
            message_id: message.id.0,
        })
    }

    async fn edit_message(
        &self,
        target: &MessageRef,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<()> {
        let mut request = self
            .bot
            .edit_message_text(ChatId(target.chat_id), MessageId(target.message_id), text)
            .parse_mode(ParseMode::Html);

        if let Some(markup) = keyboard {
            request = request.reply_markup(markup);
        }

        request.await?;
        Ok(())
    }

    async fn create_topic(&self, chat_id: i64, title: &str) -> Result<i64> {
        let topic = self
            .bot
            .create_forum_topic(ChatId(chat_id), title, Rgb::from_u32(0x6FB9F0), String::new())
            .await?;
        Ok(topic.thread_id.0 .0 as i64)
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        let mut request = self.bot.answer_callback_query(callback_id.to_string());
        if let Some(notice) = text {
            request = request.text(notice);
        }
        request.await?;
        Ok(())
    }
}

impl std::fmt::Debug for TelegramTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramTransport").finish_non_exhaustive()
    }
}
