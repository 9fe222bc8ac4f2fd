//! Store-level integration tests
//!
//! These run only when a PostgreSQL instance is reachable via DATABASE_URL;
//! without one they pass silently.

use sqlx::PgPool;

use PayBuddy::database::DatabaseService;
use PayBuddy::models::payment::PaymentStatus;
use PayBuddy::services::ledger::LedgerEngine;

async fn test_db() -> Option<DatabaseService> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let pool = PgPool::connect(&url).await.ok()?;
    sqlx::migrate!("./migrations").run(&pool).await.ok()?;
    Some(DatabaseService::new(pool))
}

#[tokio::test]
async fn test_settlement_add_is_idempotent_while_active() {
    let Some(db) = test_db().await else { return };
    let ledger = LedgerEngine::new(db.clone());

    let username = format!("it_user_{}", std::process::id());
    let admin_id = "999000111";

    let first = ledger
        .add_to_settlement(&username, admin_id, Some("10"), "actor_a")
        .await
        .unwrap();
    let second = ledger
        .add_to_settlement(&username, admin_id, Some("12"), "actor_b")
        .await
        .unwrap();

    // Same row updated in place, not duplicated
    assert_eq!(first.id, second.id);
    assert_eq!(second.price.as_deref(), Some("12"));
    assert_eq!(second.added_by, "actor_b");

    // Checkout frees the pair: the next add creates a fresh row
    let affected = ledger.checkout(admin_id, "actor_a").await.unwrap();
    assert!(affected >= 1);

    let third = ledger
        .add_to_settlement(&username, admin_id, None, "actor_c")
        .await
        .unwrap();
    assert_ne!(third.id, second.id);

    ledger.checkout(admin_id, "cleanup").await.unwrap();
}

#[tokio::test]
async fn test_payment_mark_is_idempotent() {
    let Some(db) = test_db().await else { return };
    let ledger = LedgerEngine::new(db.clone());

    let username = format!("it_pay_{}", std::process::id());

    let first = ledger
        .mark_payment(&username, PaymentStatus::Paid, "actor_a")
        .await
        .unwrap();
    assert!(first.is_applied());

    let stamped = db.payments.get(&username).await.unwrap().unwrap();

    // Re-applying the same status reports "already marked" and leaves the
    // record untouched
    let second = ledger
        .mark_payment(&username, PaymentStatus::Paid, "actor_b")
        .await
        .unwrap();
    assert!(!second.is_applied());

    let after = db.payments.get(&username).await.unwrap().unwrap();
    assert_eq!(after.last_set_by, stamped.last_set_by);
    assert_eq!(after.last_set_at, stamped.last_set_at);

    // Any state is reachable from any state
    let third = ledger
        .mark_payment(&username, PaymentStatus::Dismissed, "actor_b")
        .await
        .unwrap();
    assert!(third.is_applied());
}

#[tokio::test]
async fn test_snapshot_overwrite_semantics() {
    let Some(db) = test_db().await else { return };

    let username = format!("it_snap_{}", std::process::id());

    db.snapshots
        .upsert(&username, "active", Some("2025-01-01T00:00:00Z"))
        .await
        .unwrap();
    db.snapshots
        .upsert(&username, "on_hold", None)
        .await
        .unwrap();

    let snapshot = db.snapshots.get(&username).await.unwrap().unwrap();
    assert_eq!(snapshot.status, "on_hold");
    assert!(snapshot.expire.is_none());
}

#[tokio::test]
async fn test_sync_flag_roundtrip() {
    let Some(db) = test_db().await else { return };

    db.sync_flags.set("initial_sync_complete", "false").await.unwrap();
    assert!(!db.sync_flags.is_sync_complete().await.unwrap());

    db.sync_flags.set("initial_sync_complete", "true").await.unwrap();
    assert!(db.sync_flags.is_sync_complete().await.unwrap());
}
