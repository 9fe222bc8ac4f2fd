//! Ledger engine
//!
//! Payment-status bookkeeping and the settlement list. Payment marking is an
//! unconditional overwrite between any two states, except that re-applying
//! the current status is a no-op reported as "already marked" (the
//! timestamp and actor stay untouched). Settlement adds are idempotent per
//! active (username, admin) pair; checkout flips all of an admin's active
//! entries in one stamped transition.

use std::collections::HashMap;

use tracing::info;

use crate::database::DatabaseService;
use crate::models::payment::{PaymentRecord, PaymentStatus};
use crate::models::settlement::{SettlementEntry, SettlementTotal};
use crate::utils::errors::Result;
use crate::utils::logging::log_ledger_action;

/// Outcome of a payment-status transition
#[derive(Debug, Clone)]
pub enum MarkOutcome {
    Applied(PaymentRecord),
    AlreadyMarked,
}

impl MarkOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, MarkOutcome::Applied(_))
    }
}

/// Whether a transition to `target` should write, given the current state.
///
/// Absent records read as `Unknown`.
pub fn should_apply(current: Option<PaymentStatus>, target: PaymentStatus) -> bool {
    current.unwrap_or(PaymentStatus::Unknown) != target
}

/// Sum an admin's active settlement entries.
///
/// Entry prices win; `fallback_prices` (the administratively configured
/// per-user prices) fill the gaps. Entries whose effective price is missing,
/// non-numeric or non-positive count as `items_without_price` and contribute
/// nothing to the total. Checked-out entries never participate.
pub fn summarize_entries(
    entries: &[SettlementEntry],
    fallback_prices: &HashMap<String, String>,
) -> SettlementTotal {
    let mut total = 0.0;
    let mut items_with_price = 0;
    let mut items_without_price = 0;

    for entry in entries.iter().filter(|e| !e.checked_out) {
        let effective = entry
            .price
            .as_deref()
            .or_else(|| fallback_prices.get(&entry.username).map(String::as_str));

        match effective.and_then(|p| p.trim().parse::<f64>().ok()) {
            Some(price) if price > 0.0 => {
                total += price;
                items_with_price += 1;
            }
            _ => items_without_price += 1,
        }
    }

    SettlementTotal {
        total,
        items_with_price,
        items_without_price,
    }
}

#[derive(Debug, Clone)]
pub struct LedgerEngine {
    db: DatabaseService,
}

impl LedgerEngine {
    pub fn new(db: DatabaseService) -> Self {
        Self { db }
    }

    /// Transition a username to the target payment status.
    ///
    /// The ledger write commits before any caller-side message cosmetics.
    pub async fn mark_payment(
        &self,
        username: &str,
        target: PaymentStatus,
        actor_id: &str,
    ) -> Result<MarkOutcome> {
        let current = self.db.payments.get(username).await?.map(|r| r.status());

        if !should_apply(current, target) {
            info!(
                username = username,
                status = %target,
                "Payment status unchanged, skipping rewrite"
            );
            return Ok(MarkOutcome::AlreadyMarked);
        }

        let record = self.db.payments.set(username, target, actor_id).await?;
        log_ledger_action(username, target.as_str(), actor_id, None);
        Ok(MarkOutcome::Applied(record))
    }

    /// Dismiss a username from payment tracking
    pub async fn dismiss(&self, username: &str, actor_id: &str) -> Result<MarkOutcome> {
        self.mark_payment(username, PaymentStatus::Dismissed, actor_id)
            .await
    }

    /// Add (or refresh) a username on an admin's settlement list
    pub async fn add_to_settlement(
        &self,
        username: &str,
        admin_telegram_id: &str,
        price: Option<&str>,
        added_by: &str,
    ) -> Result<SettlementEntry> {
        let entry = self
            .db
            .settlements
            .upsert_active(username, admin_telegram_id, price, added_by)
            .await?;

        log_ledger_action(username, "add_settlement", added_by, Some(admin_telegram_id));
        Ok(entry)
    }

    /// Check out all active entries for an admin; returns the count affected
    pub async fn checkout(&self, admin_telegram_id: &str, actor_id: &str) -> Result<u64> {
        let affected = self.db.settlements.checkout(admin_telegram_id, actor_id).await?;
        info!(
            admin_id = admin_telegram_id,
            actor_id = actor_id,
            entries = affected,
            "Settlement list checked out"
        );
        Ok(affected)
    }

    /// List the active settlement entries for an admin
    pub async fn list_settlement(&self, admin_telegram_id: &str) -> Result<Vec<SettlementEntry>> {
        self.db.settlements.list_active(admin_telegram_id).await
    }

    /// Compute totals over an admin's active entries with price fallback
    pub async fn compute_total(&self, admin_telegram_id: &str) -> Result<SettlementTotal> {
        let entries = self.db.settlements.list_active(admin_telegram_id).await?;
        let usernames: Vec<String> = entries.iter().map(|e| e.username.clone()).collect();
        let fallback = self.db.prices.get_many(&usernames).await?;

        Ok(summarize_entries(&entries, &fallback))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(username: &str, price: Option<&str>, checked_out: bool) -> SettlementEntry {
        SettlementEntry {
            id: 1,
            username: username.to_string(),
            admin_telegram_id: "4242".to_string(),
            price: price.map(str::to_string),
            added_by: "actor".to_string(),
            added_at: Utc::now(),
            checked_out,
            checked_out_at: None,
            checked_out_by: None,
        }
    }

    #[test]
    fn test_should_apply_transitions() {
        assert!(should_apply(None, PaymentStatus::Paid));
        assert!(should_apply(Some(PaymentStatus::Paid), PaymentStatus::Unpaid));
        assert!(should_apply(Some(PaymentStatus::Dismissed), PaymentStatus::Paid));
        assert!(!should_apply(Some(PaymentStatus::Paid), PaymentStatus::Paid));
        assert!(!should_apply(None, PaymentStatus::Unknown));
    }

    #[test]
    fn test_summarize_sums_entry_prices() {
        let entries = vec![
            entry("alice", Some("10.5"), false),
            entry("bob", Some("4.5"), false),
        ];
        let totals = summarize_entries(&entries, &HashMap::new());

        assert_eq!(totals.total, 15.0);
        assert_eq!(totals.items_with_price, 2);
        assert_eq!(totals.items_without_price, 0);
    }

    #[test]
    fn test_summarize_falls_back_to_user_prices() {
        let entries = vec![entry("alice", None, false), entry("bob", None, false)];
        let mut fallback = HashMap::new();
        fallback.insert("alice".to_string(), "7".to_string());

        let totals = summarize_entries(&entries, &fallback);
        assert_eq!(totals.total, 7.0);
        assert_eq!(totals.items_with_price, 1);
        assert_eq!(totals.items_without_price, 1);
    }

    #[test]
    fn test_summarize_rejects_bad_prices() {
        let entries = vec![
            entry("alice", Some("0"), false),
            entry("bob", Some("-3"), false),
            entry("carol", Some("NaNsense"), false),
            entry("dave", Some("12"), false),
        ];
        let totals = summarize_entries(&entries, &HashMap::new());

        assert_eq!(totals.total, 12.0);
        assert_eq!(totals.items_with_price, 1);
        assert_eq!(totals.items_without_price, 3);
    }

    #[test]
    fn test_summarize_excludes_checked_out() {
        let entries = vec![
            entry("alice", Some("10"), true),
            entry("bob", Some("5"), false),
        ];
        let totals = summarize_entries(&entries, &HashMap::new());

        assert_eq!(totals.total, 5.0);
        assert_eq!(totals.items_with_price, 1);
        assert_eq!(totals.items_without_price, 0);
    }
}
