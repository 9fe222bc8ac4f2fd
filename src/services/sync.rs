//! Admin sync engine
//!
//! Reconciles the full admin roster fetched from the panel API against the
//! destination registry. Identity is keyed by Telegram id, so re-running the
//! sync converges the registry instead of duplicating entries. Admins
//! without a Telegram id cannot be routed and are skipped entirely.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use crate::database::repositories::{INITIAL_SYNC_COMPLETE, LAST_SYNC};
use crate::database::DatabaseService;
use crate::services::panel::PanelApiClient;
use crate::services::router::{NotificationRouter, ProvisionStatus};
use crate::utils::errors::{PanelError, PayBuddyError, Result};

/// Counters reported by one sync run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub created: u32,
    pub updated: u32,
    pub skipped: u32,
    pub errors: u32,
}

#[derive(Clone)]
pub struct AdminSyncEngine {
    panel: Option<Arc<PanelApiClient>>,
    router: NotificationRouter,
    db: DatabaseService,
}

impl AdminSyncEngine {
    pub fn new(
        panel: Option<Arc<PanelApiClient>>,
        router: NotificationRouter,
        db: DatabaseService,
    ) -> Self {
        Self { panel, router, db }
    }

    pub fn is_configured(&self) -> bool {
        self.panel.is_some()
    }

    /// Fetch the roster and converge the destination registry.
    ///
    /// On completion (even with per-admin errors) the sync gate opens and
    /// the last-sync timestamp is stamped.
    pub async fn sync_from_api(&self) -> Result<SyncReport> {
        let panel = self
            .panel
            .as_ref()
            .ok_or(PayBuddyError::Panel(PanelError::NotConfigured))?;

        let admins = panel.get_all_admins().await.map_err(PayBuddyError::Panel)?;
        let mut report = SyncReport::default();

        for admin in &admins {
            let Some(telegram_id) = admin.telegram_id else {
                report.skipped += 1;
                continue;
            };
            let admin_id = telegram_id.to_string();

            match self.db.admin_topics.get(&admin_id).await {
                Ok(Some(existing)) => {
                    if existing.admin_username.as_deref() != Some(admin.username.as_str()) {
                        match self
                            .db
                            .admin_topics
                            .update_username(&admin_id, &admin.username)
                            .await
                        {
                            Ok(()) => report.updated += 1,
                            Err(e) => {
                                warn!(admin_id = %admin_id, error = %e, "Failed to refresh admin name");
                                report.errors += 1;
                            }
                        }
                    }
                }
                Ok(None) => match self
                    .router
                    .register_admin(&admin_id, Some(admin.username.as_str()))
                    .await
                {
                    Ok(outcome) => {
                        report.created += 1;
                        if outcome.provision == ProvisionStatus::Failed {
                            report.errors += 1;
                        }
                    }
                    Err(e) => {
                        warn!(admin_id = %admin_id, error = %e, "Failed to register admin");
                        report.errors += 1;
                    }
                },
                Err(e) => {
                    warn!(admin_id = %admin_id, error = %e, "Failed to look up admin");
                    report.errors += 1;
                }
            }
        }

        self.db.sync_flags.set(INITIAL_SYNC_COMPLETE, "true").await?;
        self.db
            .sync_flags
            .set(LAST_SYNC, &Utc::now().to_rfc3339())
            .await?;

        self.db
            .audit
            .append(
                "admin_sync",
                None,
                None,
                None,
                Some(json!({
                    "fetched": admins.len(),
                    "created": report.created,
                    "updated": report.updated,
                    "skipped": report.skipped,
                    "errors": report.errors,
                })),
            )
            .await?;

        info!(
            fetched = admins.len(),
            created = report.created,
            updated = report.updated,
            skipped = report.skipped,
            errors = report.errors,
            "Admin sync completed"
        );
        Ok(report)
    }

    /// Test panel connectivity; false when the panel is not configured
    pub async fn test_panel_connection(&self) -> bool {
        match self.panel.as_ref() {
            Some(panel) => panel.test_connection().await,
            None => false,
        }
    }
}

impl std::fmt::Debug for AdminSyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSyncEngine")
            .field("configured", &self.is_configured())
            .finish_non_exhaustive()
    }
}
