//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the PayBuddy application.

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;
use crate::utils::errors::Result;

/// Initialize logging based on configuration
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let file_appender = tracing_appender::rolling::daily(&config.file_path, "paybuddy.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking))
        .init();

    info!("Logging initialized with level: {}", config.level);
    Ok(())
}

/// Log a triage decision with structured data
pub fn log_triage_decision(username: &str, action: &str, send: bool, reason: Option<&str>) {
    info!(
        username = username,
        action = action,
        send = send,
        reason = reason,
        "Triage decision made"
    );
}

/// Log an interactive ledger action
pub fn log_ledger_action(username: &str, action: &str, actor_id: &str, details: Option<&str>) {
    info!(
        username = username,
        action = action,
        actor_id = actor_id,
        details = details,
        "Ledger action performed"
    );
}

/// Log degraded routing outcomes
pub fn log_routing_degraded(admin_id: &str, reason: &str) {
    warn!(
        admin_id = admin_id,
        reason = reason,
        "Notification routing degraded"
    );
}
