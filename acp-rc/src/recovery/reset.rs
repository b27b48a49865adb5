//! Reset primitive shared by the failure hooks and the sweeper

use acp_common::Phase;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db;
use crate::models::RecoveryStrategy;

/// Resolve the phase an item is reset to.
///
/// `Reprocess` steps one phase back from the failed phase (clamped to
/// `research`) so upstream data is regenerated; the other strategies keep
/// the failed phase and only change how the downstream worker retries.
pub fn resolve_target_phase(failed_phase: Phase, strategy: RecoveryStrategy) -> Phase {
    match strategy {
        RecoveryStrategy::Reprocess => failed_phase.step_back(),
        RecoveryStrategy::Retry | RecoveryStrategy::JsonRepair => failed_phase,
    }
}

/// Reset an item so normal phase workers pick it up again.
///
/// One atomic UPDATE: phase set to `target_phase`, attempt counter zeroed,
/// error/rejection text and completed_at cleared, phase_started_at
/// refreshed. Non-throwing: returns `false` when the write fails or the
/// item does not exist, and the caller logs instead of propagating.
pub async fn reset_item(
    pool: &SqlitePool,
    item_id: Uuid,
    target_phase: Phase,
    strategy: RecoveryStrategy,
) -> bool {
    match db::items::apply_reset(pool, item_id, target_phase, Utc::now()).await {
        Ok(0) => {
            warn!(item_id = %item_id, "Reset skipped: item not found");
            false
        }
        Ok(_) => {
            info!(
                item_id = %item_id,
                target_phase = %target_phase,
                strategy = %strategy,
                "Item reset for recovery"
            );
            true
        }
        Err(e) => {
            warn!(item_id = %item_id, error = %e, "Reset write failed");
            false
        }
    }
}
