//! Payment tracking model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Payment bookkeeping state for one username
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Unknown,
    Paid,
    Unpaid,
    Dismissed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unknown => "Unknown",
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Unpaid => "Unpaid",
            PaymentStatus::Dismissed => "Dismissed",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "Paid" => PaymentStatus::Paid,
            "Unpaid" => PaymentStatus::Unpaid,
            "Dismissed" => PaymentStatus::Dismissed,
            _ => PaymentStatus::Unknown,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored payment record; absent rows read as `Unknown`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PaymentRecord {
    pub username: String,
    pub payment_status: String,
    pub last_set_by: Option<String>,
    pub last_set_at: DateTime<Utc>,
}

impl PaymentRecord {
    pub fn status(&self) -> PaymentStatus {
        PaymentStatus::parse(&self.payment_status)
    }
}
