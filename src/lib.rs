//! PayBuddy Telegram Bot
//!
//! A Telegram bot that relays account lifecycle events from a management
//! panel's webhook into per-admin forum topics and tracks payment and
//! settlement bookkeeping driven by inline-button presses.

#![allow(non_snake_case)]

pub mod api;
pub mod config;
pub mod database;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{PayBuddyError, Result};

// Re-export main components for easy access
pub use database::DatabaseService;
pub use services::AppContext;
pub use state::SessionStorage;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
