//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{PayBuddyError, Result};
use super::Settings;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_bot_config(&settings.bot)?;
    validate_server_config(&settings.server)?;
    validate_database_config(&settings.database)?;
    validate_redis_config(&settings.redis)?;
    validate_logging_config(&settings.logging)?;

    if let Some(ref panel_config) = settings.panel {
        validate_panel_config(panel_config)?;
    }

    Ok(())
}

/// Validate bot configuration
fn validate_bot_config(config: &super::BotConfig) -> Result<()> {
    if config.token.is_empty() {
        return Err(PayBuddyError::Config(
            "Bot token is required".to_string()
        ));
    }

    if config.admin_ids.is_empty() {
        return Err(PayBuddyError::Config(
            "At least one operator ID must be configured".to_string()
        ));
    }

    Ok(())
}

/// Validate webhook server configuration
fn validate_server_config(config: &super::ServerConfig) -> Result<()> {
    if config.host.is_empty() {
        return Err(PayBuddyError::Config(
            "Server host is required".to_string()
        ));
    }

    if config.port == 0 {
        return Err(PayBuddyError::Config(
            "Server port must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(PayBuddyError::Config(
            "Database URL is required".to_string()
        ));
    }

    if config.max_connections == 0 {
        return Err(PayBuddyError::Config(
            "Max connections must be greater than 0".to_string()
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(PayBuddyError::Config(
            "Min connections cannot be greater than max connections".to_string()
        ));
    }

    Ok(())
}

/// Validate Redis configuration
fn validate_redis_config(config: &super::RedisConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(PayBuddyError::Config(
            "Redis URL is required".to_string()
        ));
    }

    Ok(())
}

/// Validate panel API configuration
fn validate_panel_config(config: &super::PanelConfig) -> Result<()> {
    url::Url::parse(&config.api_url)
        .map_err(|e| PayBuddyError::Config(format!("Invalid panel API URL: {}", e)))?;

    if config.username.is_empty() || config.password.is_empty() {
        return Err(PayBuddyError::Config(
            "Panel API credentials are required when the panel section is present".to_string()
        ));
    }

    if config.timeout_seconds == 0 {
        return Err(PayBuddyError::Config(
            "Panel timeout must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(PayBuddyError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(PayBuddyError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PanelConfig;

    fn valid_settings() -> Settings {
        let mut settings = Settings::default();
        settings.bot.token = "123:token".to_string();
        settings.bot.admin_ids = vec![1];
        settings
    }

    #[test]
    fn test_validate_ok() {
        assert!(validate_settings(&valid_settings()).is_ok());
    }

    #[test]
    fn test_missing_token_rejected() {
        let mut settings = valid_settings();
        settings.bot.token = String::new();
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_bad_panel_url_rejected() {
        let mut settings = valid_settings();
        settings.panel = Some(PanelConfig {
            api_url: "not a url".to_string(),
            username: "admin".to_string(),
            password: "secret".to_string(),
            timeout_seconds: 30,
        });
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_bad_log_level_rejected() {
        let mut settings = valid_settings();
        settings.logging.level = "verbose".to_string();
        assert!(validate_settings(&settings).is_err());
    }
}
