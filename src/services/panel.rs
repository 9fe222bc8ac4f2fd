//! Panel API client implementation
//!
//! This service handles authentication and data fetching from the panel's
//! REST API: password-grant token auth, bearer requests with a single
//! automatic re-authentication on 401, and paginated roster draining.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::PanelConfig;
use crate::utils::errors::{PanelError, PanelResult};

const PAGE_SIZE: i64 = 100;
const TOKEN_LIFETIME_HOURS: i64 = 24;
const TOKEN_REFRESH_BUFFER_MINUTES: i64 = 5;

/// One admin as reported by the panel roster
#[derive(Debug, Clone, Deserialize)]
pub struct PanelAdmin {
    #[serde(default)]
    pub id: Option<i64>,
    pub username: String,
    #[serde(default)]
    pub telegram_id: Option<i64>,
}

/// One page of the paginated admin listing
#[derive(Debug, Clone, Deserialize)]
pub struct AdminsPage {
    #[serde(default)]
    pub admins: Vec<PanelAdmin>,
    #[serde(default)]
    pub total: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Clone)]
struct TokenState {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Authenticated client for the panel API
#[derive(Debug)]
pub struct PanelApiClient {
    client: Client,
    base_url: String,
    username: String,
    password: String,
    token: Mutex<Option<TokenState>>,
}

impl PanelApiClient {
    /// Create a new client from configuration
    pub fn new(config: &PanelConfig) -> PanelResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent("PayBuddy-Bot/1.0")
            .build()
            .map_err(|e| PanelError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
            token: Mutex::new(None),
        })
    }

    /// Authenticate with the panel and cache the access token
    async fn authenticate(&self) -> PanelResult<String> {
        let url = format!("{}/api/admin/token", self.base_url);
        debug!(url = %url, "Authenticating with panel API");

        let response = self
            .client
            .post(&url)
            .form(&[
                ("username", self.username.as_str()),
                ("password", self.password.as_str()),
                ("grant_type", "password"),
            ])
            .send()
            .await
            .map_err(map_reqwest_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PanelError::AuthenticationFailed(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| PanelError::InvalidResponse(e.to_string()))?;

        let state = TokenState {
            access_token: token.access_token.clone(),
            expires_at: Utc::now() + chrono::Duration::hours(TOKEN_LIFETIME_HOURS),
        };
        *self.token.lock().await = Some(state);

        info!("Successfully authenticated with panel API");
        Ok(token.access_token)
    }

    /// Return a valid access token, re-authenticating when missing or close
    /// to expiry
    async fn ensure_token(&self) -> PanelResult<String> {
        {
            let guard = self.token.lock().await;
            if let Some(state) = guard.as_ref() {
                let refresh_at =
                    state.expires_at - chrono::Duration::minutes(TOKEN_REFRESH_BUFFER_MINUTES);
                if Utc::now() < refresh_at {
                    return Ok(state.access_token.clone());
                }
            }
        }

        self.authenticate().await
    }

    /// Authenticated GET with one automatic re-auth on 401
    async fn authorized_get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> PanelResult<T> {
        let mut token = self.ensure_token().await?;
        let url = format!("{}{}", self.base_url, path);

        for attempt in 0..2 {
            let response = self
                .client
                .get(&url)
                .bearer_auth(&token)
                .query(query)
                .send()
                .await
                .map_err(map_reqwest_error)?;

            match response.status() {
                StatusCode::UNAUTHORIZED if attempt == 0 => {
                    warn!(path = path, "Panel token rejected, re-authenticating");
                    token = self.authenticate().await?;
                }
                status if status.is_success() => {
                    return response
                        .json()
                        .await
                        .map_err(|e| PanelError::InvalidResponse(e.to_string()));
                }
                status => {
                    let body = response.text().await.unwrap_or_default();
                    return Err(PanelError::RequestFailed(format!(
                        "HTTP {}: {}",
                        status, body
                    )));
                }
            }
        }

        Err(PanelError::AuthenticationFailed(
            "token rejected after re-authentication".to_string(),
        ))
    }

    /// Fetch one page of the admin roster
    pub async fn get_admins(&self, offset: i64, limit: i64) -> PanelResult<AdminsPage> {
        self.authorized_get(
            "/api/admins",
            &[("offset", offset.to_string()), ("limit", limit.to_string())],
        )
        .await
    }

    /// Fetch the full admin roster, draining pagination to exhaustion
    pub async fn get_all_admins(&self) -> PanelResult<Vec<PanelAdmin>> {
        let mut all_admins = Vec::new();
        let mut offset = 0;

        loop {
            let page = self.get_admins(offset, PAGE_SIZE).await?;
            let fetched = page.admins.len() as i64;
            all_admins.extend(page.admins);

            if offset + PAGE_SIZE >= page.total || fetched < PAGE_SIZE {
                break;
            }
            offset += PAGE_SIZE;
        }

        info!(count = all_admins.len(), "Fetched admins from panel");
        Ok(all_admins)
    }

    /// Get details of the authenticated admin
    pub async fn get_current_admin(&self) -> PanelResult<PanelAdmin> {
        self.authorized_get("/api/admin", &[]).await
    }

    /// Test connectivity and credentials
    pub async fn test_connection(&self) -> bool {
        match self.get_current_admin().await {
            Ok(admin) => {
                info!(username = %admin.username, "Connected to panel");
                true
            }
            Err(e) => {
                warn!(error = %e, "Panel connection test failed");
                false
            }
        }
    }
}

fn map_reqwest_error(e: reqwest::Error) -> PanelError {
    if e.is_timeout() {
        PanelError::Timeout
    } else if e.is_connect() {
        PanelError::ServiceUnavailable
    } else {
        PanelError::RequestFailed(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: &str) -> PanelConfig {
        PanelConfig {
            api_url: base_url.to_string(),
            username: "admin".to_string(),
            password: "secret".to_string(),
            timeout_seconds: 5,
        }
    }

    async fn mock_token_endpoint(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/api/admin/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "test-token",
                "token_type": "bearer"
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_get_all_admins_drains_pagination() {
        let server = MockServer::start().await;
        mock_token_endpoint(&server).await;

        Mock::given(method("GET"))
            .and(path("/api/admins"))
            .and(query_param("offset", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "admins": (0..100).map(|i| json!({
                    "id": i, "username": format!("admin{}", i), "telegram_id": 1000 + i
                })).collect::<Vec<_>>(),
                "total": 130
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/admins"))
            .and(query_param("offset", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "admins": (100..130).map(|i| json!({
                    "id": i, "username": format!("admin{}", i), "telegram_id": null
                })).collect::<Vec<_>>(),
                "total": 130
            })))
            .mount(&server)
            .await;

        let client = PanelApiClient::new(&test_config(&server.uri())).unwrap();
        let admins = client.get_all_admins().await.unwrap();

        assert_eq!(admins.len(), 130);
        assert_eq!(admins[0].username, "admin0");
        assert!(admins[129].telegram_id.is_none());
    }

    #[tokio::test]
    async fn test_authentication_failure_surfaces() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/admin/token"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
            .mount(&server)
            .await;

        let client = PanelApiClient::new(&test_config(&server.uri())).unwrap();
        let result = client.get_admins(0, 100).await;

        assert!(matches!(result, Err(PanelError::AuthenticationFailed(_))));
    }

    #[tokio::test]
    async fn test_test_connection_ok() {
        let server = MockServer::start().await;
        mock_token_endpoint(&server).await;

        Mock::given(method("GET"))
            .and(path("/api/admin"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 1, "username": "root", "telegram_id": 999
            })))
            .mount(&server)
            .await;

        let client = PanelApiClient::new(&test_config(&server.uri())).unwrap();
        assert!(client.test_connection().await);
    }
}
