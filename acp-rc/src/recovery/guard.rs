//! Loop guard
//!
//! The recovery log is the sole loop-prevention mechanism: before any
//! automatic reset, the engine checks for a prior `recovered` entry for the
//! same target inside the trailing window. No item may be auto-recovered
//! twice within the window, regardless of whether a reactive hook or the
//! sweeper attempts it.
//!
//! There is no row locking on resets; under concurrent schedulers two
//! racing resets could still interleave. The guard narrows that race to the
//! gap between check and reset, which is accepted given the cooperative
//! single-writer-per-item scheduling this service runs under.

use chrono::Duration;
use sqlx::SqlitePool;
use std::collections::HashSet;
use tracing::warn;
use uuid::Uuid;

use crate::db;

/// Per-item check used by the reactive hooks.
///
/// Fails open on query errors only in the conservative direction: a failed
/// check reports "recently recovered" so the engine never resets on
/// uncertain information.
pub async fn was_recently_recovered(pool: &SqlitePool, item_id: Uuid, window: Duration) -> bool {
    match db::recovery_log::has_recovered_entry_since(pool, &item_id.to_string(), window).await {
        Ok(recovered) => recovered,
        Err(e) => {
            warn!(item_id = %item_id, error = %e, "Loop-guard query failed; treating as recovered");
            true
        }
    }
}

/// Batch form for the sweeper: one query for the whole window instead of
/// one per candidate. Returns `None` on query failure so the sweeper can
/// abort rather than re-touch items it cannot dedup against.
pub async fn recently_recovered_set(pool: &SqlitePool, window: Duration) -> Option<HashSet<String>> {
    match db::recovery_log::recovered_targets_since(pool, window).await {
        Ok(set) => Some(set),
        Err(e) => {
            warn!(error = %e, "Batch loop-guard query failed");
            None
        }
    }
}
