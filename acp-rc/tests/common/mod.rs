//! Shared test helpers: in-memory database, engine and item fixtures
#![allow(dead_code)]

use acp_common::config::{JobRegistry, RecoveryPolicy};
use acp_common::Phase;
use acp_rc::models::ProductionItem;
use acp_rc::RecoveryEngine;
use chrono::{DateTime, Duration, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use uuid::Uuid;

/// In-memory database with the service schema.
///
/// Pinned to a single connection: each connection of an in-memory SQLite
/// pool would otherwise see its own empty database.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    acp_rc::db::init_tables(&pool)
        .await
        .expect("Failed to initialize database schema");

    pool
}

/// Engine with default policy and job registry
pub fn test_engine(pool: &SqlitePool) -> RecoveryEngine {
    RecoveryEngine::new(
        pool.clone(),
        RecoveryPolicy::default(),
        JobRegistry::default(),
    )
}

/// Insert an item mid-pipeline at the given phase
pub async fn insert_active_item(pool: &SqlitePool, phase: Phase, attempts: i64) -> ProductionItem {
    let mut item = ProductionItem::new("site-a", "en-US", "test keyword");
    item.current_phase = phase;
    item.phase_attempts = attempts;
    acp_rc::db::items::insert_item(pool, &item)
        .await
        .expect("Failed to insert item");
    item
}

/// Insert a rejected item with a stored rejection reason
pub async fn insert_rejected_item(
    pool: &SqlitePool,
    site_id: &str,
    rejection_reason: &str,
    completed_at: DateTime<Utc>,
) -> ProductionItem {
    let mut item = ProductionItem::new(site_id, "en-US", "test keyword");
    item.current_phase = Phase::Rejected;
    item.phase_attempts = 3;
    item.last_error = Some(rejection_reason.to_string());
    item.rejection_reason = Some(rejection_reason.to_string());
    item.completed_at = Some(completed_at);
    acp_rc::db::items::insert_item(pool, &item)
        .await
        .expect("Failed to insert item");
    item
}

/// Reload an item, panicking if it vanished
pub async fn reload(pool: &SqlitePool, item_id: Uuid) -> ProductionItem {
    acp_rc::db::items::get_item(pool, item_id)
        .await
        .expect("Failed to load item")
        .expect("Item missing")
}

/// All log entries from the last hour, newest first
pub async fn recent_log(pool: &SqlitePool) -> Vec<acp_rc::models::RecoveryLogEntry> {
    acp_rc::db::recovery_log::query_entries(pool, Utc::now() - Duration::hours(1), None, None, 100)
        .await
        .expect("Failed to query recovery log")
}
