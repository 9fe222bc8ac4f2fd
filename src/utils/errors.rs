//! Error handling for PayBuddy
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy.

use thiserror::Error;

/// Main error type for PayBuddy application
#[derive(Error, Debug)]
pub enum PayBuddyError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Telegram API error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("Panel API error: {0}")]
    Panel(#[from] PanelError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Panel API specific errors
#[derive(Error, Debug)]
pub enum PanelError {
    #[error("Panel API request failed: {0}")]
    RequestFailed(String),

    #[error("Panel API timeout")]
    Timeout,

    #[error("Panel authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Invalid panel response: {0}")]
    InvalidResponse(String),

    #[error("Panel API not configured")]
    NotConfigured,

    #[error("Panel service unavailable")]
    ServiceUnavailable,
}

/// Result type alias for PayBuddy operations
pub type Result<T> = std::result::Result<T, PayBuddyError>;

/// Result type alias for panel API operations
pub type PanelResult<T> = std::result::Result<T, PanelError>;

impl PayBuddyError {
    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            PayBuddyError::Database(_) => false,
            PayBuddyError::Migration(_) => false,
            PayBuddyError::Telegram(_) => true,
            PayBuddyError::Panel(_) => true,
            PayBuddyError::Config(_) => false,
            PayBuddyError::Redis(_) => true,
            PayBuddyError::Http(_) => true,
            PayBuddyError::Serialization(_) => false,
            PayBuddyError::Io(_) => true,
            PayBuddyError::UrlParse(_) => false,
            PayBuddyError::InvalidInput(_) => false,
            PayBuddyError::ServiceUnavailable(_) => true,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            PayBuddyError::Database(_) => ErrorSeverity::Critical,
            PayBuddyError::Migration(_) => ErrorSeverity::Critical,
            PayBuddyError::Config(_) => ErrorSeverity::Critical,
            PayBuddyError::InvalidInput(_) => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
