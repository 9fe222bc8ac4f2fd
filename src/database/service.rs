//! Database service layer
//!
//! This module provides a high-level interface to database operations

use crate::database::{
    AdminTopicRepository, AuditRepository, DatabasePool, PaymentRepository, PriceRepository,
    SettlementRepository, SnapshotRepository, SyncFlagRepository,
};

#[derive(Debug, Clone)]
pub struct DatabaseService {
    pub snapshots: SnapshotRepository,
    pub payments: PaymentRepository,
    pub prices: PriceRepository,
    pub settlements: SettlementRepository,
    pub admin_topics: AdminTopicRepository,
    pub audit: AuditRepository,
    pub sync_flags: SyncFlagRepository,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            snapshots: SnapshotRepository::new(pool.clone()),
            payments: PaymentRepository::new(pool.clone()),
            prices: PriceRepository::new(pool.clone()),
            settlements: SettlementRepository::new(pool.clone()),
            admin_topics: AdminTopicRepository::new(pool.clone()),
            audit: AuditRepository::new(pool.clone()),
            sync_flags: SyncFlagRepository::new(pool),
        }
    }
}
