//! Payment status repository implementation

use sqlx::PgPool;
use chrono::Utc;
use crate::models::payment::{PaymentRecord, PaymentStatus};
use crate::utils::errors::PayBuddyError;

#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: PgPool,
}

impl PaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the payment record for a username; absent means `Unknown`
    pub async fn get(&self, username: &str) -> Result<Option<PaymentRecord>, PayBuddyError> {
        let record = sqlx::query_as::<_, PaymentRecord>(
            "SELECT username, payment_status, last_set_by, last_set_at FROM payments WHERE username = $1"
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Set the payment status, stamping actor and time
    pub async fn set(
        &self,
        username: &str,
        status: PaymentStatus,
        set_by: &str,
    ) -> Result<PaymentRecord, PayBuddyError> {
        let record = sqlx::query_as::<_, PaymentRecord>(
            r#"
            INSERT INTO payments (username, payment_status, last_set_by, last_set_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (username)
            DO UPDATE SET payment_status = EXCLUDED.payment_status,
                          last_set_by = EXCLUDED.last_set_by,
                          last_set_at = EXCLUDED.last_set_at
            RETURNING username, payment_status, last_set_by, last_set_at
            "#
        )
        .bind(username)
        .bind(status.as_str())
        .bind(set_by)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }
}
