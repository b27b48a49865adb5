//! Reactive failure hooks
//!
//! Phase workers, job runners and the promotion step call these from their
//! failure paths. Each hook classifies the failure, consults the loop guard
//! where a reset is possible, applies at most one bounded mutation, and
//! records the decision in the recovery log.

use acp_common::config::JobFamily;
use acp_common::Phase;
use tracing::{info, warn};
use uuid::Uuid;

use super::classifier::classify;
use super::reset::{reset_item, resolve_target_phase};
use super::{guard, RecoveryEngine};
use crate::db;
use crate::models::{
    ErrorCategory, RecoveryEventType, RecoveryLogEntry, RecoveryOutcome, RecoveryStrategy,
};

/// Attempts at one phase before the worker rejects the item. The workers
/// enforce this; `was_rejected = true` means the threshold was hit.
const MAX_PHASE_ATTEMPTS: i64 = 3;

impl RecoveryEngine {
    /// Hook for a single item failing a phase.
    ///
    /// Decision order:
    /// 1. auth/quality failures are terminal for automation: log only.
    /// 2. rejected + retryable category: loop-guard check, then reset at
    ///    the same phase (`json_repair` for JSON failures, else `retry`).
    /// 3. below the attempt threshold: the scheduler retries naturally,
    ///    log for observability only.
    /// 4. rejected with an unclassified/non-retryable category: one
    ///    optimistic `retry` reset, still behind the loop guard.
    pub async fn on_pipeline_failure(
        &self,
        item_id: Uuid,
        phase: Phase,
        error_text: &str,
        attempt_number: i64,
        was_rejected: bool,
    ) {
        let category = classify(error_text);
        let source = format!("phase:{}", phase);
        let target = item_id.to_string();
        let context = self.item_context(item_id).await;

        info!(
            item_id = %item_id,
            phase = %phase,
            category = %category,
            attempt = attempt_number,
            was_rejected,
            "Pipeline failure reported"
        );

        if category.requires_human() {
            self.log(
                RecoveryLogEntry::new(
                    RecoveryEventType::PipelineFailure,
                    &source,
                    &target,
                    error_text,
                    &format!(
                        "{} failure requires operator action; no automatic recovery",
                        category
                    ),
                    category,
                    RecoveryOutcome::NotRecoverable,
                )
                .with_context(context),
            )
            .await;
            return;
        }

        if was_rejected && category.is_auto_recoverable() {
            if guard::was_recently_recovered(&self.db, item_id, self.recovery_window()).await {
                self.log(
                    RecoveryLogEntry::new(
                        RecoveryEventType::PipelineFailure,
                        &source,
                        &target,
                        error_text,
                        "Already recovered recently; leaving alone to break repair loop",
                        category,
                        RecoveryOutcome::Logged,
                    )
                    .with_context(context),
                )
                .await;
                return;
            }

            let strategy = if category == ErrorCategory::JsonParse {
                RecoveryStrategy::JsonRepair
            } else {
                RecoveryStrategy::Retry
            };
            self.reset_and_log(item_id, phase, strategy, category, error_text, &source, context)
                .await;
            return;
        }

        if !was_rejected && attempt_number < MAX_PHASE_ATTEMPTS {
            self.log(
                RecoveryLogEntry::new(
                    RecoveryEventType::PipelineFailure,
                    &source,
                    &target,
                    error_text,
                    &format!(
                        "Attempt {} of {}; scheduler retries the phase on its next pass",
                        attempt_number, MAX_PHASE_ATTEMPTS
                    ),
                    category,
                    RecoveryOutcome::WillRetry,
                )
                .with_context(context),
            )
            .await;
            return;
        }

        if was_rejected {
            // Unclassified or non-retryable category on a rejected item:
            // one optimistic reset rather than leaving it stuck forever.
            if guard::was_recently_recovered(&self.db, item_id, self.recovery_window()).await {
                self.log(
                    RecoveryLogEntry::new(
                        RecoveryEventType::PipelineFailure,
                        &source,
                        &target,
                        error_text,
                        "Already recovered recently; leaving alone to break repair loop",
                        category,
                        RecoveryOutcome::Logged,
                    )
                    .with_context(context),
                )
                .await;
                return;
            }
            self.reset_and_log(
                item_id,
                phase,
                RecoveryStrategy::Retry,
                category,
                error_text,
                &source,
                context,
            )
            .await;
            return;
        }

        // Attempts exhausted but the worker did not reject: inconsistent
        // caller state, record it and touch nothing.
        warn!(item_id = %item_id, attempt = attempt_number, "Attempt threshold hit without rejection");
        self.log(
            RecoveryLogEntry::new(
                RecoveryEventType::PipelineFailure,
                &source,
                &target,
                error_text,
                "Attempt threshold reached but item was not rejected; no action taken",
                category,
                RecoveryOutcome::Logged,
            )
            .with_context(context),
        )
        .await;
    }

    /// Hook for a completed item failing the transition to published.
    ///
    /// Duplicate-key violations are left to the promotion step, which
    /// regenerates its unique identifier on the next attempt; resetting
    /// here would race that logic. Other data-integrity failures step the
    /// item back one phase before scoring so the missing data is rebuilt.
    pub async fn on_promotion_failure(&self, item_id: Uuid, error_text: &str) {
        let category = classify(error_text);
        let target = item_id.to_string();
        let context = self.item_context(item_id).await;

        info!(item_id = %item_id, category = %category, "Promotion failure reported");

        if category != ErrorCategory::DataIntegrity {
            self.log(
                RecoveryLogEntry::new(
                    RecoveryEventType::PromotionFailure,
                    "promotion",
                    &target,
                    error_text,
                    "Not a data-integrity failure; recorded only",
                    category,
                    RecoveryOutcome::Logged,
                )
                .with_context(context),
            )
            .await;
            return;
        }

        if is_duplicate_violation(error_text) {
            self.log(
                RecoveryLogEntry::new(
                    RecoveryEventType::PromotionFailure,
                    "promotion",
                    &target,
                    error_text,
                    "Unique-key collision; promotion regenerates the identifier on its next attempt",
                    category,
                    RecoveryOutcome::WillRetry,
                )
                .with_context(context),
            )
            .await;
            return;
        }

        // Missing field / broken reference: regenerate the data one phase
        // before scoring so the next promotion attempt sees complete input.
        let target_phase = resolve_target_phase(Phase::Scoring, RecoveryStrategy::Reprocess);
        if reset_item(&self.db, item_id, target_phase, RecoveryStrategy::Reprocess).await {
            self.log(
                RecoveryLogEntry::new(
                    RecoveryEventType::PromotionFailure,
                    "promotion",
                    &target,
                    error_text,
                    "Data-integrity failure; reprocessing from one phase before scoring",
                    category,
                    RecoveryOutcome::Recovered,
                )
                .with_fix(
                    &format!("reset to {} with strategy reprocess", target_phase),
                    chrono::Utc::now(),
                )
                .with_context(context),
            )
            .await;
        } else {
            self.log(
                RecoveryLogEntry::new(
                    RecoveryEventType::PromotionFailure,
                    "promotion",
                    &target,
                    error_text,
                    "Data-integrity failure but the reset write failed",
                    category,
                    RecoveryOutcome::Logged,
                )
                .with_context(context),
            )
            .await;
        }
    }

    /// Hook for an entire scheduled run crashing.
    ///
    /// Routed by the injected job-family table: a dead content-production
    /// run triggers a scoped sweep, optimization/audit jobs just retry on
    /// their next slot, and a dead topic job escalates once the backlog
    /// drops below the low-water mark.
    pub async fn on_cron_failure(&self, job_name: &str, error_text: &str, site_id: Option<&str>) {
        let category = classify(error_text);
        let family = self.jobs.family_of(job_name);

        info!(job = job_name, ?family, category = %category, "Cron failure reported");

        match family {
            JobFamily::ContentProduction => {
                let recovered = self.run_sweep(site_id).await;
                let outcome = if recovered > 0 {
                    RecoveryOutcome::Recovered
                } else {
                    RecoveryOutcome::Logged
                };
                self.log(
                    RecoveryLogEntry::new(
                        RecoveryEventType::CronFailure,
                        job_name,
                        job_name,
                        error_text,
                        "Content-production run crashed; ran targeted sweep for stuck items",
                        category,
                        outcome,
                    )
                    .with_fix_text(&format!("targeted sweep recovered {} item(s)", recovered))
                    .with_context(serde_json::json!({ "site_id": site_id })),
                )
                .await;
            }
            JobFamily::OptimizationAudit => {
                self.log(
                    RecoveryLogEntry::new(
                        RecoveryEventType::CronFailure,
                        job_name,
                        job_name,
                        error_text,
                        "Non-critical optimization/audit job; next scheduled run retries",
                        category,
                        RecoveryOutcome::WillRetry,
                    )
                    .with_context(serde_json::json!({ "site_id": site_id })),
                )
                .await;
            }
            JobFamily::TopicGeneration => {
                self.check_topic_backlog(job_name, error_text, category, site_id)
                    .await;
            }
            JobFamily::Unknown => {
                self.log(
                    RecoveryLogEntry::new(
                        RecoveryEventType::CronFailure,
                        job_name,
                        job_name,
                        error_text,
                        "Job not in any known family; recorded only",
                        category,
                        RecoveryOutcome::Logged,
                    )
                    .with_context(serde_json::json!({ "site_id": site_id })),
                )
                .await;
            }
        }
    }

    /// Topic job crashed: only escalate once the backlog is actually short
    async fn check_topic_backlog(
        &self,
        job_name: &str,
        error_text: &str,
        category: ErrorCategory,
        site_id: Option<&str>,
    ) {
        let low_water = self.policy.topic_backlog_low_water;

        match db::topics::pending_topic_count(&self.db, site_id).await {
            Ok(count) if count < low_water => {
                warn!(job = job_name, backlog = count, low_water, "Topic backlog below low-water mark");
                self.log(
                    RecoveryLogEntry::new(
                        RecoveryEventType::TopicBacklogAlert,
                        job_name,
                        job_name,
                        error_text,
                        &format!(
                            "Topic generation failing with backlog at {} (low-water {}); production will starve",
                            count, low_water
                        ),
                        category,
                        RecoveryOutcome::CriticalAlert,
                    )
                    .with_context(serde_json::json!({ "site_id": site_id, "backlog": count })),
                )
                .await;
            }
            Ok(count) => {
                self.log(
                    RecoveryLogEntry::new(
                        RecoveryEventType::CronFailure,
                        job_name,
                        job_name,
                        error_text,
                        &format!("Topic backlog at {} is sufficient; next run retries", count),
                        category,
                        RecoveryOutcome::WillRetry,
                    )
                    .with_context(serde_json::json!({ "site_id": site_id, "backlog": count })),
                )
                .await;
            }
            Err(e) => {
                warn!(job = job_name, error = %e, "Backlog count query failed");
                self.log(
                    RecoveryLogEntry::new(
                        RecoveryEventType::CronFailure,
                        job_name,
                        job_name,
                        error_text,
                        "Could not determine topic backlog size; recorded only",
                        category,
                        RecoveryOutcome::Logged,
                    )
                    .with_context(serde_json::json!({ "site_id": site_id })),
                )
                .await;
            }
        }
    }

    /// Shared reset-then-log step for the pipeline hook paths
    async fn reset_and_log(
        &self,
        item_id: Uuid,
        phase: Phase,
        strategy: RecoveryStrategy,
        category: ErrorCategory,
        error_text: &str,
        source: &str,
        context: serde_json::Value,
    ) {
        let target_phase = resolve_target_phase(phase, strategy);
        let target = item_id.to_string();
        let context = enrich_with_strategy(context, strategy);

        if reset_item(&self.db, item_id, target_phase, strategy).await {
            self.log(
                RecoveryLogEntry::new(
                    RecoveryEventType::AutoRecovery,
                    source,
                    &target,
                    error_text,
                    &format!("Rejected item reactivated at phase {}", target_phase),
                    category,
                    RecoveryOutcome::Recovered,
                )
                .with_fix(
                    &format!("reset to {} with strategy {}", target_phase, strategy),
                    chrono::Utc::now(),
                )
                .with_context(context),
            )
            .await;
        } else {
            self.log(
                RecoveryLogEntry::new(
                    RecoveryEventType::PipelineFailure,
                    source,
                    &target,
                    error_text,
                    "Recovery attempted but the reset write failed",
                    category,
                    RecoveryOutcome::Logged,
                )
                .with_context(context),
            )
            .await;
        }
    }
}

/// Uniqueness/duplicate violation, e.g. a slug collision on publish
fn is_duplicate_violation(error_text: &str) -> bool {
    let lower = error_text.to_lowercase();
    lower.contains("unique") || lower.contains("duplicate")
}

/// Fold the strategy into the context blob without clobbering enrichment
fn enrich_with_strategy(context: serde_json::Value, strategy: RecoveryStrategy) -> serde_json::Value {
    match context {
        serde_json::Value::Object(mut map) => {
            map.insert(
                "strategy".to_string(),
                serde_json::Value::String(strategy.to_string()),
            );
            serde_json::Value::Object(map)
        }
        _ => serde_json::json!({ "strategy": strategy }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_violation_detection() {
        assert!(is_duplicate_violation(
            "UNIQUE constraint failed: articles.slug"
        ));
        assert!(is_duplicate_violation("duplicate key value"));
        assert!(!is_duplicate_violation(
            "Foreign key constraint failed on author_id"
        ));
    }

    #[test]
    fn test_strategy_enrichment_preserves_context() {
        let ctx = serde_json::json!({ "site_id": "s1" });
        let enriched = enrich_with_strategy(ctx, RecoveryStrategy::JsonRepair);
        assert_eq!(enriched["site_id"], "s1");
        assert_eq!(enriched["strategy"], "json_repair");
    }
}
