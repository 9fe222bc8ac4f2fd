//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub bot: BotConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub panel: Option<PanelConfig>,
    pub logging: LoggingConfig,
}

/// Telegram bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BotConfig {
    pub token: String,
    /// Operators allowed to run administrative commands
    pub admin_ids: Vec<i64>,
    /// Parent chat used to provision per-admin forum topics; also the
    /// degraded delivery destination when provisioning fails
    pub fallback_chat_id: Option<i64>,
}

/// Webhook server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Shared secret required in the x-webhook-secret header; checks are
    /// skipped entirely when unset
    pub webhook_secret: Option<String>,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Redis configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedisConfig {
    pub url: String,
    pub prefix: String,
    pub ttl_seconds: u64,
}

/// Panel API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PanelConfig {
    pub api_url: String,
    pub username: String,
    pub password: String,
    pub timeout_seconds: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: String,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("PAYBUDDY"))
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::PayBuddyError> {
        super::validation::validate_settings(self)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                token: String::new(),
                admin_ids: vec![],
                fallback_chat_id: None,
            },
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                webhook_secret: None,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/paybuddy".to_string(),
                max_connections: 10,
                min_connections: 1,
            },
            redis: RedisConfig {
                url: "redis://localhost:6379".to_string(),
                prefix: "paybuddy:".to_string(),
                ttl_seconds: 600,
            },
            panel: None,
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: "/var/log/paybuddy".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.database.max_connections, 10);
        assert!(settings.database.url.contains("postgresql://"));
        assert!(settings.panel.is_none());
        assert!(settings.server.webhook_secret.is_none());
    }
}
