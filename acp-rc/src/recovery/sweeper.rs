//! Targeted sweeper
//!
//! Bounded scheduled fallback: re-activates items stuck in `rejected`
//! within a recent window that the reactive hooks missed. The batch cap
//! and lookback window keep this a safety net, never an unbounded backfill
//! that competes with live production for generation capacity.

use acp_common::Phase;
use chrono::Duration;
use tracing::{debug, info, warn};

use super::classifier::classify;
use super::reset::reset_item;
use super::{guard, RecoveryEngine};
use crate::db;
use crate::models::{
    ErrorCategory, RecoveryEventType, RecoveryLogEntry, RecoveryOutcome, RecoveryStrategy,
};

/// Phase to resume at when the rejection text names no phase
const FALLBACK_PHASE: Phase = Phase::Outline;

impl RecoveryEngine {
    /// One bounded sweep pass. Returns the number of items actually reset.
    ///
    /// Candidates are recently rejected items with a stored rejection
    /// reason, capped per policy, deduplicated against the loop-guard set
    /// built once for the whole batch. Each retryable candidate resumes at
    /// the phase named in its rejection text.
    pub async fn sweep(&self, site_id: Option<&str>) -> usize {
        let Some(recovered_set) =
            guard::recently_recovered_set(&self.db, self.recovery_window()).await
        else {
            // Cannot dedup: sweeping blind risks double recovery, skip.
            return 0;
        };

        let window = Duration::hours(self.policy().sweep_window_hours);
        let candidates = match db::items::rejected_items_since(
            &self.db,
            window,
            site_id,
            self.policy().sweep_item_limit,
        )
        .await
        {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "Sweep candidate query failed");
                return 0;
            }
        };

        debug!(
            candidates = candidates.len(),
            site_id = site_id.unwrap_or("all"),
            "Sweep pass starting"
        );

        let mut recovered = 0;
        for item in candidates {
            let target = item.id.to_string();
            if recovered_set.contains(&target) {
                debug!(item_id = %item.id, "Skipping: already recovered within window");
                continue;
            }

            let reason = item.rejection_reason.as_deref().unwrap_or("");
            let category = classify(reason);
            if !category.is_auto_recoverable() {
                debug!(item_id = %item.id, category = %category, "Skipping: not auto-recoverable");
                continue;
            }

            let target_phase = Phase::parse_loose(reason).unwrap_or(FALLBACK_PHASE);
            if reset_item(&self.db, item.id, target_phase, RecoveryStrategy::Retry).await {
                recovered += 1;
                self.log(
                    RecoveryLogEntry::new(
                        RecoveryEventType::AutoRecovery,
                        "targeted-sweeper",
                        &target,
                        reason,
                        &format!("Stuck rejected item reactivated at phase {}", target_phase),
                        category,
                        RecoveryOutcome::Recovered,
                    )
                    .with_fix(
                        &format!("reset to {} with strategy retry", target_phase),
                        chrono::Utc::now(),
                    )
                    .with_context(serde_json::json!({
                        "phase": target_phase,
                        "site_id": item.site_id,
                        "locale": item.locale,
                        "keyword": item.keyword,
                        "strategy": RecoveryStrategy::Retry,
                    })),
                )
                .await;
            }
        }

        info!(recovered, site_id = site_id.unwrap_or("all"), "Sweep pass complete");
        recovered
    }

    /// Sweep plus the single batch-summary log entry callers rely on
    pub async fn run_sweep(&self, site_id: Option<&str>) -> usize {
        let recovered = self.sweep(site_id).await;

        let scope = site_id
            .map(|s| format!("site:{}", s))
            .unwrap_or_else(|| "all_sites".to_string());
        let outcome = if recovered > 0 {
            RecoveryOutcome::Recovered
        } else {
            RecoveryOutcome::Logged
        };

        self.log(
            RecoveryLogEntry::new(
                RecoveryEventType::TargetedSweep,
                "targeted-sweeper",
                &scope,
                "scheduled sweep over recently rejected items",
                &format!("Targeted sweep recovered {} item(s)", recovered),
                ErrorCategory::Unknown,
                outcome,
            )
            .with_fix_text(&format!("targeted sweep recovered {} item(s)", recovered))
            .with_context(serde_json::json!({
                "site_id": site_id,
                "recovered": recovered,
                "item_limit": self.policy().sweep_item_limit,
                "window_hours": self.policy().sweep_window_hours,
            })),
        )
        .await;

        recovered
    }
}
