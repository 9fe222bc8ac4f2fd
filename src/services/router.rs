//! Notification router
//!
//! Resolves a panel admin to their Telegram destination (chat + optional
//! forum topic), auto-registering unknown admins and auto-provisioning a
//! dedicated topic under the configured parent chat on first contact.
//! Delivery is best-effort: failures are logged and swallowed so a broken
//! chat destination can never fail event processing.

use std::sync::Arc;

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use tracing::{error, info, warn};

use crate::database::AdminTopicRepository;
use crate::models::admin_topic::AdminTopic;
use crate::models::callback::{CallbackAction, CallbackToken};
use crate::services::transport::ChatTransport;
use crate::utils::errors::{PayBuddyError, Result};
use crate::utils::helpers::truncate_text;
use crate::utils::logging::log_routing_degraded;

/// Display cap applied to outbound message bodies
pub const MAX_MESSAGE_CHARS: usize = 4000;

/// How topic provisioning went during registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionStatus {
    /// A dedicated forum topic was created
    Created,
    /// Provisioning was attempted and failed; delivery falls back to the
    /// parent chat
    Failed,
    /// No parent chat is configured, nothing to provision
    Skipped,
}

/// Result of registering an admin destination
#[derive(Debug, Clone)]
pub struct RegistrationOutcome {
    pub topic: AdminTopic,
    pub provision: ProvisionStatus,
}

#[derive(Clone)]
pub struct NotificationRouter {
    topics: AdminTopicRepository,
    transport: Arc<dyn ChatTransport>,
    parent_chat_id: Option<i64>,
}

impl NotificationRouter {
    pub fn new(
        topics: AdminTopicRepository,
        transport: Arc<dyn ChatTransport>,
        parent_chat_id: Option<i64>,
    ) -> Self {
        Self {
            topics,
            transport,
            parent_chat_id,
        }
    }

    /// Deliver a notification to the admin's destination.
    ///
    /// Never propagates delivery failures to the caller.
    pub async fn route(
        &self,
        admin_telegram_id: &str,
        admin_username: &str,
        message: &str,
        username: &str,
        event_key: &str,
    ) {
        if let Err(e) = self
            .try_route(admin_telegram_id, admin_username, message, username, event_key)
            .await
        {
            error!(
                admin_id = admin_telegram_id,
                username = username,
                error = %e,
                "Failed to deliver notification"
            );
        }
    }

    async fn try_route(
        &self,
        admin_telegram_id: &str,
        admin_username: &str,
        message: &str,
        username: &str,
        event_key: &str,
    ) -> Result<()> {
        let destination = match self.topics.get(admin_telegram_id).await? {
            Some(existing) => {
                if existing.admin_username.as_deref() != Some(admin_username) {
                    self.topics
                        .update_username(admin_telegram_id, admin_username)
                        .await?;
                }
                existing
            }
            None => {
                self.register_admin(admin_telegram_id, Some(admin_username))
                    .await?
                    .topic
            }
        };

        if !destination.has_destination() {
            error!(
                admin_id = admin_telegram_id,
                "No destination chat available, dropping notification"
            );
            return Ok(());
        }

        let chat_id: i64 = destination.chat_id.parse().map_err(|_| {
            PayBuddyError::InvalidInput(format!("Stored chat id is not numeric: {}", destination.chat_id))
        })?;
        let topic_id = destination
            .topic_id
            .as_deref()
            .and_then(|t| t.parse::<i64>().ok());

        let keyboard = accounting_keyboard(username, admin_telegram_id, event_key);
        let text = truncate_text(message, MAX_MESSAGE_CHARS);

        self.transport
            .send_message(chat_id, topic_id, &text, Some(keyboard))
            .await?;

        info!(
            admin_id = admin_telegram_id,
            chat_id = chat_id,
            topic_id = ?topic_id,
            username = username,
            "Notification delivered"
        );
        Ok(())
    }

    /// Register a new admin destination, provisioning a dedicated topic
    /// under the parent chat when possible.
    ///
    /// The mapping is persisted unconditionally: provisioning failure falls
    /// back to the parent chat itself, and a missing parent chat records an
    /// empty destination (degraded but remembered).
    pub async fn register_admin(
        &self,
        admin_telegram_id: &str,
        admin_username: Option<&str>,
    ) -> Result<RegistrationOutcome> {
        let display_name = admin_username.unwrap_or("unknown");

        let (chat_id, topic_id, provision) = match self.parent_chat_id {
            Some(parent) => {
                let title = format!("💰 {}", display_name);
                match self.transport.create_topic(parent, &title).await {
                    Ok(topic) => (
                        parent.to_string(),
                        Some(topic.to_string()),
                        ProvisionStatus::Created,
                    ),
                    Err(e) => {
                        warn!(
                            admin_id = admin_telegram_id,
                            parent_chat = parent,
                            error = %e,
                            "Topic provisioning failed, delivering to parent chat"
                        );
                        (parent.to_string(), None, ProvisionStatus::Failed)
                    }
                }
            }
            None => {
                log_routing_degraded(admin_telegram_id, "no parent chat configured");
                (String::new(), None, ProvisionStatus::Skipped)
            }
        };

        let topic = self
            .topics
            .upsert(admin_telegram_id, admin_username, &chat_id, topic_id.as_deref())
            .await?;

        info!(
            admin_id = admin_telegram_id,
            chat_id = %topic.chat_id,
            topic_id = ?topic.topic_id,
            provision = ?provision,
            "Admin destination registered"
        );

        Ok(RegistrationOutcome { topic, provision })
    }
}

/// Build the interactive keyboard attached to accounting notifications
pub fn accounting_keyboard(
    username: &str,
    admin_telegram_id: &str,
    event_key: &str,
) -> InlineKeyboardMarkup {
    let token = |action: CallbackAction| {
        CallbackToken::new(action, username, admin_telegram_id, event_key).encode()
    };

    InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::callback("Paid ✅", token(CallbackAction::Paid)),
            InlineKeyboardButton::callback("Unpaid ❌", token(CallbackAction::Unpaid)),
        ],
        vec![InlineKeyboardButton::callback(
            "➕ Add to settlement list",
            token(CallbackAction::AddSettlement),
        )],
    ])
}

impl std::fmt::Debug for NotificationRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationRouter")
            .field("parent_chat_id", &self.parent_chat_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::InlineKeyboardButtonKind;

    #[test]
    fn test_keyboard_tokens_decode() {
        let markup = accounting_keyboard("alice", "4242", "created_alice_1700000000");
        let buttons: Vec<_> = markup.inline_keyboard.iter().flatten().collect();
        assert_eq!(buttons.len(), 3);

        for button in buttons {
            let InlineKeyboardButtonKind::CallbackData(data) = &button.kind else {
                panic!("expected callback button");
            };
            let token = CallbackToken::parse(data).unwrap();
            assert_eq!(token.username, "alice");
            assert_eq!(token.admin_telegram_id, "4242");
        }
    }
}
