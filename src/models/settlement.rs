//! Settlement ledger models

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// One settlement list entry.
///
/// At most one entry per (username, admin) pair is active at a time; adding
/// again while active updates the row in place. Checkout flips all active
/// entries for an admin in one stamped transition.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SettlementEntry {
    pub id: i64,
    pub username: String,
    pub admin_telegram_id: String,
    pub price: Option<String>,
    pub added_by: String,
    pub added_at: DateTime<Utc>,
    pub checked_out: bool,
    pub checked_out_at: Option<DateTime<Utc>>,
    pub checked_out_by: Option<String>,
}

/// Administratively configured per-user price, consulted as a fallback when
/// a settlement entry carries no price of its own
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserPrice {
    pub username: String,
    pub price: String,
    pub set_by: String,
    pub set_at: DateTime<Utc>,
}

/// Computed totals over an admin's active settlement entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementTotal {
    pub total: f64,
    pub items_with_price: usize,
    pub items_without_price: usize,
}
