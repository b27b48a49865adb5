//! Production item database operations

use acp_common::{Error, Phase, Result};
use chrono::{DateTime, Duration, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::models::ProductionItem;

/// Insert a new production item
pub async fn insert_item(pool: &SqlitePool, item: &ProductionItem) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO production_items (
            id, site_id, locale, keyword, current_phase, phase_attempts,
            last_error, rejection_reason, phase_started_at, completed_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(item.id.to_string())
    .bind(&item.site_id)
    .bind(&item.locale)
    .bind(&item.keyword)
    .bind(item.current_phase.as_str())
    .bind(item.phase_attempts)
    .bind(&item.last_error)
    .bind(&item.rejection_reason)
    .bind(item.phase_started_at.to_rfc3339())
    .bind(item.completed_at.map(|dt| dt.to_rfc3339()))
    .execute(pool)
    .await?;

    Ok(())
}

/// Load a production item by id
pub async fn get_item(pool: &SqlitePool, item_id: Uuid) -> Result<Option<ProductionItem>> {
    let row = sqlx::query(
        r#"
        SELECT id, site_id, locale, keyword, current_phase, phase_attempts,
               last_error, rejection_reason, phase_started_at, completed_at
        FROM production_items
        WHERE id = ?
        "#,
    )
    .bind(item_id.to_string())
    .fetch_optional(pool)
    .await?;

    row.map(row_to_item).transpose()
}

/// Apply the recovery reset mutation in a single UPDATE.
///
/// Sets the phase, zeroes the attempt counter, clears error/rejection text
/// and completed_at, and refreshes phase_started_at. Returns the number of
/// rows touched (0 when the item does not exist).
pub async fn apply_reset(
    pool: &SqlitePool,
    item_id: Uuid,
    target_phase: Phase,
    now: DateTime<Utc>,
) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE production_items
        SET current_phase = ?,
            phase_attempts = 0,
            last_error = NULL,
            rejection_reason = NULL,
            completed_at = NULL,
            phase_started_at = ?
        WHERE id = ?
        "#,
    )
    .bind(target_phase.as_str())
    .bind(now.to_rfc3339())
    .bind(item_id.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Select sweep candidates: rejected items with a stored rejection reason
/// whose completed_at falls within the trailing window, oldest first,
/// capped at `limit`. Optionally scoped to one site.
pub async fn rejected_items_since(
    pool: &SqlitePool,
    window: Duration,
    site_id: Option<&str>,
    limit: u32,
) -> Result<Vec<ProductionItem>> {
    let cutoff = (Utc::now() - window).to_rfc3339();

    let rows = match site_id {
        Some(site) => {
            sqlx::query(
                r#"
                SELECT id, site_id, locale, keyword, current_phase, phase_attempts,
                       last_error, rejection_reason, phase_started_at, completed_at
                FROM production_items
                WHERE current_phase = 'rejected'
                  AND rejection_reason IS NOT NULL
                  AND completed_at >= ?
                  AND site_id = ?
                ORDER BY completed_at ASC
                LIMIT ?
                "#,
            )
            .bind(&cutoff)
            .bind(site)
            .bind(limit)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query(
                r#"
                SELECT id, site_id, locale, keyword, current_phase, phase_attempts,
                       last_error, rejection_reason, phase_started_at, completed_at
                FROM production_items
                WHERE current_phase = 'rejected'
                  AND rejection_reason IS NOT NULL
                  AND completed_at >= ?
                ORDER BY completed_at ASC
                LIMIT ?
                "#,
            )
            .bind(&cutoff)
            .bind(limit)
            .fetch_all(pool)
            .await?
        }
    };

    rows.into_iter().map(row_to_item).collect()
}

fn row_to_item(row: sqlx::sqlite::SqliteRow) -> Result<ProductionItem> {
    let id: String = row.get("id");
    let id = Uuid::parse_str(&id)
        .map_err(|e| Error::Internal(format!("Invalid item id in database: {}", e)))?;

    let phase: String = row.get("current_phase");
    let current_phase: Phase = phase.parse()?;

    let phase_started_at: String = row.get("phase_started_at");
    let phase_started_at = parse_timestamp(&phase_started_at)?;

    let completed_at: Option<String> = row.get("completed_at");
    let completed_at = completed_at.as_deref().map(parse_timestamp).transpose()?;

    Ok(ProductionItem {
        id,
        site_id: row.get("site_id"),
        locale: row.get("locale"),
        keyword: row.get("keyword"),
        current_phase,
        phase_attempts: row.get("phase_attempts"),
        last_error: row.get("last_error"),
        rejection_reason: row.get("rejection_reason"),
        phase_started_at,
        completed_at,
    })
}

fn parse_timestamp(text: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Invalid timestamp in database: {}", e)))
}
