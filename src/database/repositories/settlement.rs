//! Settlement ledger repository implementation

use sqlx::PgPool;
use chrono::Utc;
use crate::models::settlement::SettlementEntry;
use crate::utils::errors::PayBuddyError;

#[derive(Debug, Clone)]
pub struct SettlementRepository {
    pool: PgPool,
}

impl SettlementRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Add a username to an admin's settlement list.
    ///
    /// Upsert against the partial unique index on active pairs: a second add
    /// while an active entry exists updates price/added_by/added_at in place
    /// instead of creating a duplicate, atomically even under concurrent
    /// calls for the same pair.
    pub async fn upsert_active(
        &self,
        username: &str,
        admin_telegram_id: &str,
        price: Option<&str>,
        added_by: &str,
    ) -> Result<SettlementEntry, PayBuddyError> {
        let entry = sqlx::query_as::<_, SettlementEntry>(
            r#"
            INSERT INTO settlement_entries (username, admin_telegram_id, price, added_by, added_at, checked_out)
            VALUES ($1, $2, $3, $4, $5, FALSE)
            ON CONFLICT (username, admin_telegram_id) WHERE NOT checked_out
            DO UPDATE SET price = EXCLUDED.price,
                          added_by = EXCLUDED.added_by,
                          added_at = EXCLUDED.added_at
            RETURNING id, username, admin_telegram_id, price, added_by, added_at,
                      checked_out, checked_out_at, checked_out_by
            "#
        )
        .bind(username)
        .bind(admin_telegram_id)
        .bind(price)
        .bind(added_by)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(entry)
    }

    /// List the active (not yet checked out) entries for an admin
    pub async fn list_active(
        &self,
        admin_telegram_id: &str,
    ) -> Result<Vec<SettlementEntry>, PayBuddyError> {
        let entries = sqlx::query_as::<_, SettlementEntry>(
            r#"
            SELECT id, username, admin_telegram_id, price, added_by, added_at,
                   checked_out, checked_out_at, checked_out_by
            FROM settlement_entries
            WHERE admin_telegram_id = $1 AND NOT checked_out
            ORDER BY added_at
            "#
        )
        .bind(admin_telegram_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Flip all active entries for an admin to checked-out in one stamped
    /// transition; returns the number of entries affected.
    pub async fn checkout(
        &self,
        admin_telegram_id: &str,
        checked_out_by: &str,
    ) -> Result<u64, PayBuddyError> {
        let result = sqlx::query(
            r#"
            UPDATE settlement_entries
            SET checked_out = TRUE,
                checked_out_at = $2,
                checked_out_by = $3
            WHERE admin_telegram_id = $1 AND NOT checked_out
            "#
        )
        .bind(admin_telegram_id)
        .bind(Utc::now())
        .bind(checked_out_by)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
