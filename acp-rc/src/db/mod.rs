//! Database access for acp-rc
//!
//! Shared SQLite database access. Enums are stored as snake_case TEXT and
//! timestamps as RFC 3339 TEXT, matching the models' serde representation.

pub mod items;
pub mod recovery_log;
pub mod topics;

use acp_common::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
///
/// Connects to the shared acp.db in the root folder, creating it if missing.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Proper SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Initialize acp-rc specific tables
///
/// Creates production_items, recovery_log and topics if they don't exist.
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS production_items (
            id TEXT PRIMARY KEY,
            site_id TEXT NOT NULL,
            locale TEXT NOT NULL,
            keyword TEXT NOT NULL,
            current_phase TEXT NOT NULL DEFAULT 'research',
            phase_attempts INTEGER NOT NULL DEFAULT 0,
            last_error TEXT,
            rejection_reason TEXT,
            phase_started_at TEXT NOT NULL,
            completed_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS recovery_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_type TEXT NOT NULL,
            source TEXT NOT NULL,
            target TEXT NOT NULL,
            failure_description TEXT NOT NULL,
            diagnosis TEXT NOT NULL,
            error_category TEXT NOT NULL,
            fix_applied TEXT,
            reactivated_at TEXT,
            outcome TEXT NOT NULL,
            context TEXT NOT NULL DEFAULT 'null',
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Dedup queries hit target + created_at on every hook invocation
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_recovery_log_target_time
         ON recovery_log (target, created_at)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS topics (
            id TEXT PRIMARY KEY,
            site_id TEXT NOT NULL,
            keyword TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (production_items, recovery_log, topics)");

    Ok(())
}
