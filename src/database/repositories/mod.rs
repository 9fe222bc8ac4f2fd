//! Database repositories module
//!
//! One repository per table, each owning a pool handle

pub mod admin_topic;
pub mod audit;
pub mod payment;
pub mod price;
pub mod settlement;
pub mod snapshot;
pub mod sync_flag;

pub use admin_topic::AdminTopicRepository;
pub use audit::AuditRepository;
pub use payment::PaymentRepository;
pub use price::PriceRepository;
pub use settlement::SettlementRepository;
pub use snapshot::SnapshotRepository;
pub use sync_flag::{SyncFlagRepository, INITIAL_SYNC_COMPLETE, LAST_SYNC};
