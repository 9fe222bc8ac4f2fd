//! User price repository implementation

use std::collections::HashMap;

use sqlx::PgPool;
use chrono::Utc;
use crate::models::settlement::UserPrice;
use crate::utils::errors::PayBuddyError;

#[derive(Debug, Clone)]
pub struct PriceRepository {
    pool: PgPool,
}

impl PriceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the configured price for a username
    pub async fn get(&self, username: &str) -> Result<Option<UserPrice>, PayBuddyError> {
        let price = sqlx::query_as::<_, UserPrice>(
            "SELECT username, price, set_by, set_at FROM user_prices WHERE username = $1"
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(price)
    }

    /// Set (or replace) the configured price for a username
    pub async fn set(
        &self,
        username: &str,
        price: &str,
        set_by: &str,
    ) -> Result<UserPrice, PayBuddyError> {
        let record = sqlx::query_as::<_, UserPrice>(
            r#"
            INSERT INTO user_prices (username, price, set_by, set_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (username)
            DO UPDATE SET price = EXCLUDED.price,
                          set_by = EXCLUDED.set_by,
                          set_at = EXCLUDED.set_at
            RETURNING username, price, set_by, set_at
            "#
        )
        .bind(username)
        .bind(price)
        .bind(set_by)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    /// Fetch prices for a set of usernames as a lookup map
    pub async fn get_many(
        &self,
        usernames: &[String],
    ) -> Result<HashMap<String, String>, PayBuddyError> {
        if usernames.is_empty() {
            return Ok(HashMap::new());
        }

        let prices = sqlx::query_as::<_, UserPrice>(
            "SELECT username, price, set_by, set_at FROM user_prices WHERE username = ANY($1)"
        )
        .bind(usernames)
        .fetch_all(&self.pool)
        .await?;

        Ok(prices.into_iter().map(|p| (p.username, p.price)).collect())
    }
}
