//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod admin_topic;
pub mod audit;
pub mod callback;
pub mod event;
pub mod payment;
pub mod settlement;
pub mod snapshot;

// Re-export commonly used models
pub use admin_topic::AdminTopic;
pub use audit::AuditEntry;
pub use callback::{CallbackAction, CallbackToken, generate_event_key, MAX_CALLBACK_DATA_BYTES};
pub use event::{ActorPayload, EventAction, UserPayload, UserStatus, WebhookBody, WebhookEvent};
pub use payment::{PaymentRecord, PaymentStatus};
pub use settlement::{SettlementEntry, SettlementTotal, UserPrice};
pub use snapshot::UserSnapshot;
