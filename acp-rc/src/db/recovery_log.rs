//! Recovery log database operations
//!
//! The log is append-only: entries are inserted once and never updated.
//! Reads serve two purposes: loop-guard dedup (by target + trailing window)
//! and the read-only dashboard feed.

use acp_common::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use sqlx::{Row, SqlitePool};
use std::collections::HashSet;

use crate::models::{RecoveryEventType, RecoveryLogEntry, RecoveryOutcome};

/// Append one entry to the log
pub async fn append_entry(pool: &SqlitePool, entry: &RecoveryLogEntry) -> Result<()> {
    let context = serde_json::to_string(&entry.context)
        .map_err(|e| Error::Internal(format!("Failed to serialize context: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO recovery_log (
            event_type, source, target, failure_description, diagnosis,
            error_category, fix_applied, reactivated_at, outcome, context,
            created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(entry.event_type.to_string())
    .bind(&entry.source)
    .bind(&entry.target)
    .bind(&entry.failure_description)
    .bind(&entry.diagnosis)
    .bind(entry.error_category.to_string())
    .bind(&entry.fix_applied)
    .bind(entry.reactivated_at.map(|dt| dt.to_rfc3339()))
    .bind(entry.outcome.to_string())
    .bind(&context)
    .bind(entry.created_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// True if `target` has a `recovered` entry within the trailing window
pub async fn has_recovered_entry_since(
    pool: &SqlitePool,
    target: &str,
    window: Duration,
) -> Result<bool> {
    let cutoff = (Utc::now() - window).to_rfc3339();

    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM recovery_log
         WHERE target = ? AND outcome = 'recovered' AND created_at >= ?",
    )
    .bind(target)
    .bind(&cutoff)
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}

/// All targets with a `recovered` entry within the trailing window.
///
/// Batch form of the dedup check, built once per sweep instead of one
/// query per candidate.
pub async fn recovered_targets_since(
    pool: &SqlitePool,
    window: Duration,
) -> Result<HashSet<String>> {
    let cutoff = (Utc::now() - window).to_rfc3339();

    let rows = sqlx::query(
        "SELECT DISTINCT target FROM recovery_log
         WHERE outcome = 'recovered' AND created_at >= ?",
    )
    .bind(&cutoff)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|row| row.get("target")).collect())
}

/// Dashboard query: recent entries, newest first, optionally filtered
pub async fn query_entries(
    pool: &SqlitePool,
    since: DateTime<Utc>,
    event_type: Option<RecoveryEventType>,
    outcome: Option<RecoveryOutcome>,
    limit: u32,
) -> Result<Vec<RecoveryLogEntry>> {
    let mut sql = String::from(
        "SELECT event_type, source, target, failure_description, diagnosis,
                error_category, fix_applied, reactivated_at, outcome, context,
                created_at
         FROM recovery_log
         WHERE created_at >= ?",
    );
    if event_type.is_some() {
        sql.push_str(" AND event_type = ?");
    }
    if outcome.is_some() {
        sql.push_str(" AND outcome = ?");
    }
    sql.push_str(" ORDER BY created_at DESC LIMIT ?");

    let mut query = sqlx::query(&sql).bind(since.to_rfc3339());
    if let Some(event_type) = event_type {
        query = query.bind(event_type.to_string());
    }
    if let Some(outcome) = outcome {
        query = query.bind(outcome.to_string());
    }
    query = query.bind(limit);

    let rows = query.fetch_all(pool).await?;
    rows.into_iter().map(row_to_entry).collect()
}

fn row_to_entry(row: sqlx::sqlite::SqliteRow) -> Result<RecoveryLogEntry> {
    let event_type: String = row.get("event_type");
    let error_category: String = row.get("error_category");
    let outcome: String = row.get("outcome");

    let context: String = row.get("context");
    let context = serde_json::from_str(&context)
        .map_err(|e| Error::Internal(format!("Failed to deserialize context: {}", e)))?;

    let reactivated_at: Option<String> = row.get("reactivated_at");
    let reactivated_at = reactivated_at.as_deref().map(parse_timestamp).transpose()?;

    let created_at: String = row.get("created_at");

    Ok(RecoveryLogEntry {
        event_type: event_type.parse()?,
        source: row.get("source"),
        target: row.get("target"),
        failure_description: row.get("failure_description"),
        diagnosis: row.get("diagnosis"),
        error_category: error_category.parse()?,
        fix_applied: row.get("fix_applied"),
        reactivated_at,
        outcome: outcome.parse()?,
        context,
        created_at: parse_timestamp(&created_at)?,
    })
}

fn parse_timestamp(text: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Invalid timestamp in database: {}", e)))
}
