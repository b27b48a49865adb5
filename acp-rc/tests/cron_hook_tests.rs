//! Integration tests for the cron/job failure hook

mod common;

use acp_common::Phase;
use acp_rc::models::{RecoveryEventType, RecoveryOutcome};
use chrono::Utc;
use common::{insert_rejected_item, recent_log, reload, test_engine, test_pool};
use sqlx::SqlitePool;

async fn insert_pending_topics(pool: &SqlitePool, site_id: &str, count: usize) {
    for i in 0..count {
        sqlx::query(
            "INSERT INTO topics (id, site_id, keyword, status, created_at)
             VALUES (?, ?, ?, 'pending', ?)",
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(site_id)
        .bind(format!("keyword {}", i))
        .bind(Utc::now().to_rfc3339())
        .execute(pool)
        .await
        .unwrap();
    }
}

#[tokio::test]
async fn content_job_crash_triggers_a_scoped_sweep() {
    let pool = test_pool().await;
    let engine = test_engine(&pool);
    let stuck =
        insert_rejected_item(&pool, "site-a", "drafting failed: request timed out", Utc::now())
            .await;

    engine
        .on_cron_failure("content-pipeline-site-a", "worker crashed", Some("site-a"))
        .await;

    assert_eq!(reload(&pool, stuck.id).await.current_phase, Phase::Drafting);

    let entries = recent_log(&pool).await;
    let cron = entries
        .iter()
        .find(|e| e.event_type == RecoveryEventType::CronFailure)
        .expect("cron_failure entry");
    assert_eq!(cron.outcome, RecoveryOutcome::Recovered);
    assert_eq!(cron.source, "content-pipeline-site-a");
    assert!(cron
        .fix_applied
        .as_deref()
        .unwrap()
        .contains("targeted sweep recovered 1 item"));

    // The sweep summary entry is written too
    assert!(entries
        .iter()
        .any(|e| e.event_type == RecoveryEventType::TargetedSweep));
}

#[tokio::test]
async fn content_job_crash_with_nothing_to_sweep_logs_only() {
    let pool = test_pool().await;
    let engine = test_engine(&pool);

    engine
        .on_cron_failure("article-production", "worker crashed", None)
        .await;

    let entries = recent_log(&pool).await;
    let cron = entries
        .iter()
        .find(|e| e.event_type == RecoveryEventType::CronFailure)
        .unwrap();
    assert_eq!(cron.outcome, RecoveryOutcome::Logged);
    assert!(cron
        .fix_applied
        .as_deref()
        .unwrap()
        .contains("recovered 0 item"));
}

#[tokio::test]
async fn optimization_job_crash_just_waits_for_the_next_run() {
    let pool = test_pool().await;
    let engine = test_engine(&pool);

    engine
        .on_cron_failure("seo-audit-nightly", "request timed out", None)
        .await;

    let entries = recent_log(&pool).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].event_type, RecoveryEventType::CronFailure);
    assert_eq!(entries[0].outcome, RecoveryOutcome::WillRetry);
}

#[tokio::test]
async fn topic_job_crash_with_low_backlog_escalates() {
    let pool = test_pool().await;
    let engine = test_engine(&pool);
    insert_pending_topics(&pool, "site-a", 3).await;

    engine
        .on_cron_failure("topic-generator", "provider returned 500", None)
        .await;

    let entries = recent_log(&pool).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].event_type, RecoveryEventType::TopicBacklogAlert);
    assert_eq!(entries[0].outcome, RecoveryOutcome::CriticalAlert);
    assert!(entries[0].diagnosis.contains("3"));
}

#[tokio::test]
async fn topic_job_crash_with_healthy_backlog_retries() {
    let pool = test_pool().await;
    let engine = test_engine(&pool);
    insert_pending_topics(&pool, "site-a", 25).await;

    engine
        .on_cron_failure("topic-generator", "provider returned 500", None)
        .await;

    let entries = recent_log(&pool).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].event_type, RecoveryEventType::CronFailure);
    assert_eq!(entries[0].outcome, RecoveryOutcome::WillRetry);
}

#[tokio::test]
async fn topic_backlog_check_can_be_site_scoped() {
    let pool = test_pool().await;
    let engine = test_engine(&pool);
    insert_pending_topics(&pool, "site-a", 25).await;
    insert_pending_topics(&pool, "site-b", 1).await;

    engine
        .on_cron_failure("topic-generator", "provider returned 500", Some("site-b"))
        .await;

    let entries = recent_log(&pool).await;
    assert_eq!(entries[0].event_type, RecoveryEventType::TopicBacklogAlert);
    assert_eq!(entries[0].outcome, RecoveryOutcome::CriticalAlert);
}

#[tokio::test]
async fn unknown_job_is_recorded_only() {
    let pool = test_pool().await;
    let engine = test_engine(&pool);

    engine
        .on_cron_failure("newsletter-send", "smtp unreachable", None)
        .await;

    let entries = recent_log(&pool).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].event_type, RecoveryEventType::CronFailure);
    assert_eq!(entries[0].outcome, RecoveryOutcome::Logged);
    assert!(entries[0].fix_applied.is_none());
}
