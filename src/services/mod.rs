//! Services module
//!
//! This module contains business logic services and the application-wide
//! dependency bundle

pub mod ledger;
pub mod panel;
pub mod router;
pub mod sync;
pub mod transport;
pub mod triage;

// Re-export commonly used services
pub use ledger::{LedgerEngine, MarkOutcome};
pub use panel::{PanelAdmin, PanelApiClient};
pub use router::{NotificationRouter, ProvisionStatus, RegistrationOutcome, MAX_MESSAGE_CHARS};
pub use sync::{AdminSyncEngine, SyncReport};
pub use transport::{ChatTransport, MessageRef, TelegramTransport};
pub use triage::{TriageDecision, TriageEngine, TriggerReason, EXTENSION_THRESHOLD_DAYS};

use std::sync::Arc;

use teloxide::Bot;
use tracing::warn;

use crate::config::Settings;
use crate::database::{DatabasePool, DatabaseService};
use crate::state::SessionStorage;
use crate::utils::errors::{PayBuddyError, Result};

/// Application-wide dependency bundle.
///
/// Constructed once at startup and passed explicitly into every handler;
/// there is no hidden global state. Cloning is cheap: everything inside is
/// a pool handle or an Arc.
#[derive(Clone)]
pub struct AppContext {
    pub settings: Settings,
    pub db: DatabaseService,
    pub transport: Arc<dyn ChatTransport>,
    pub panel: Option<Arc<PanelApiClient>>,
    pub triage: TriageEngine,
    pub router: NotificationRouter,
    pub ledger: LedgerEngine,
    pub sync: AdminSyncEngine,
    pub sessions: SessionStorage,
}

impl AppContext {
    /// Build the full context from settings, a database pool and the bot
    pub async fn build(settings: Settings, pool: DatabasePool, bot: Bot) -> Result<Self> {
        let db = DatabaseService::new(pool);
        let transport: Arc<dyn ChatTransport> = Arc::new(TelegramTransport::new(bot));

        let panel = match settings.panel.as_ref() {
            Some(config) => Some(Arc::new(
                PanelApiClient::new(config).map_err(PayBuddyError::Panel)?,
            )),
            None => {
                warn!("Panel API credentials not configured - admin sync disabled");
                None
            }
        };

        let triage = TriageEngine::new(db.clone());
        let router = NotificationRouter::new(
            db.admin_topics.clone(),
            transport.clone(),
            settings.bot.fallback_chat_id,
        );
        let ledger = LedgerEngine::new(db.clone());
        let sync = AdminSyncEngine::new(panel.clone(), router.clone(), db.clone());
        let sessions = SessionStorage::new(settings.redis.clone()).await?;

        Ok(Self {
            settings,
            db,
            transport,
            panel,
            triage,
            router,
            ledger,
            sync,
            sessions,
        })
    }

    /// Whether a Telegram user may run administrative commands
    pub fn is_operator(&self, user_id: i64) -> bool {
        self.settings.bot.admin_ids.contains(&user_id)
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("panel_configured", &self.panel.is_some())
            .finish_non_exhaustive()
    }
}
