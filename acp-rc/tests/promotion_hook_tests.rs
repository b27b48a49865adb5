//! Integration tests for the promotion failure hook

mod common;

use acp_common::Phase;
use acp_rc::models::{ErrorCategory, RecoveryEventType, RecoveryOutcome};
use common::{insert_active_item, recent_log, reload, test_engine, test_pool};

#[tokio::test]
async fn duplicate_slug_violation_is_left_for_the_promotion_step() {
    let pool = test_pool().await;
    let engine = test_engine(&pool);
    let item = insert_active_item(&pool, Phase::Reservoir, 0).await;

    engine
        .on_promotion_failure(item.id, "UNIQUE constraint failed: articles.slug")
        .await;

    // No mutation: the promotion step regenerates the slug itself
    let after = reload(&pool, item.id).await;
    assert_eq!(after.current_phase, Phase::Reservoir);
    assert_eq!(after.phase_attempts, 0);

    let entries = recent_log(&pool).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].event_type, RecoveryEventType::PromotionFailure);
    assert_eq!(entries[0].outcome, RecoveryOutcome::WillRetry);
    assert_eq!(entries[0].error_category, ErrorCategory::DataIntegrity);
    assert!(entries[0].fix_applied.is_none());
}

#[tokio::test]
async fn broken_foreign_key_reprocesses_from_seo() {
    let pool = test_pool().await;
    let engine = test_engine(&pool);
    let item = insert_active_item(&pool, Phase::Scoring, 0).await;

    engine
        .on_promotion_failure(item.id, "Foreign key constraint failed on author_id")
        .await;

    let after = reload(&pool, item.id).await;
    assert_eq!(after.current_phase, Phase::Seo);
    assert_eq!(after.phase_attempts, 0);
    assert!(after.completed_at.is_none());

    let entries = recent_log(&pool).await;
    assert_eq!(entries[0].outcome, RecoveryOutcome::Recovered);
    assert_eq!(entries[0].error_category, ErrorCategory::DataIntegrity);
    let fix = entries[0].fix_applied.as_deref().unwrap();
    assert!(fix.contains("seo"));
    assert!(fix.contains("reprocess"));
    assert!(entries[0].reactivated_at.is_some());
}

#[tokio::test]
async fn missing_required_field_also_reprocesses() {
    let pool = test_pool().await;
    let engine = test_engine(&pool);
    let item = insert_active_item(&pool, Phase::Reservoir, 0).await;

    engine
        .on_promotion_failure(item.id, "column meta_description is required")
        .await;

    let after = reload(&pool, item.id).await;
    assert_eq!(after.current_phase, Phase::Seo);
}

#[tokio::test]
async fn unrelated_failure_is_only_logged() {
    let pool = test_pool().await;
    let engine = test_engine(&pool);
    let item = insert_active_item(&pool, Phase::Reservoir, 0).await;

    engine
        .on_promotion_failure(item.id, "request timed out after 30s")
        .await;

    let after = reload(&pool, item.id).await;
    assert_eq!(after.current_phase, Phase::Reservoir);

    let entries = recent_log(&pool).await;
    assert_eq!(entries[0].outcome, RecoveryOutcome::Logged);
    assert_eq!(entries[0].error_category, ErrorCategory::Timeout);
    assert!(entries[0].fix_applied.is_none());
}

#[tokio::test]
async fn reset_failure_downgrades_outcome_to_logged() {
    let pool = test_pool().await;
    let engine = test_engine(&pool);

    // Item never inserted: the reset write touches zero rows
    engine
        .on_promotion_failure(
            uuid::Uuid::new_v4(),
            "Foreign key constraint failed on author_id",
        )
        .await;

    let entries = recent_log(&pool).await;
    assert_eq!(entries[0].outcome, RecoveryOutcome::Logged);
    assert!(entries[0].reactivated_at.is_none());
}
