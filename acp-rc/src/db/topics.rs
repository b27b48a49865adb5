//! Topic backlog queries
//!
//! The topic-generation job refills this table; the cron failure hook only
//! reads the pending count to decide whether a failed run matters yet.

use acp_common::Result;
use sqlx::SqlitePool;

/// Count topics still waiting to enter production, optionally per site
pub async fn pending_topic_count(pool: &SqlitePool, site_id: Option<&str>) -> Result<i64> {
    let count: i64 = match site_id {
        Some(site) => {
            sqlx::query_scalar(
                "SELECT COUNT(*) FROM topics WHERE status = 'pending' AND site_id = ?",
            )
            .bind(site)
            .fetch_one(pool)
            .await?
        }
        None => {
            sqlx::query_scalar("SELECT COUNT(*) FROM topics WHERE status = 'pending'")
                .fetch_one(pool)
                .await?
        }
    };

    Ok(count)
}
