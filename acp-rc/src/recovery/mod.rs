//! Self-healing recovery engine
//!
//! The reactive failure hooks ([`hooks`]), the scheduled safety-net sweep
//! ([`sweeper`]) and the primitives they share: error classification,
//! the reset mutation and the log-based loop guard.
//!
//! Every public entry point here is non-throwing. Failures inside the
//! engine (store unavailable, log write lost) are traced and swallowed;
//! this service is never the reason a phase worker or job runner fails.

pub mod classifier;
pub mod guard;
pub mod hooks;
pub mod reset;
pub mod sweeper;

use acp_common::config::{JobRegistry, RecoveryPolicy};
use chrono::Duration;
use sqlx::SqlitePool;
use tracing::warn;
use uuid::Uuid;

use crate::db;
use crate::models::RecoveryLogEntry;

/// The recovery engine: pool + injected policy/registry tables.
///
/// Cheap to clone; handlers share one instance through `AppState`.
#[derive(Clone)]
pub struct RecoveryEngine {
    db: SqlitePool,
    policy: RecoveryPolicy,
    jobs: JobRegistry,
}

impl RecoveryEngine {
    pub fn new(db: SqlitePool, policy: RecoveryPolicy, jobs: JobRegistry) -> Self {
        Self { db, policy, jobs }
    }

    pub fn policy(&self) -> &RecoveryPolicy {
        &self.policy
    }

    /// Loop-guard window as a chrono duration
    fn recovery_window(&self) -> Duration {
        Duration::hours(self.policy.recovery_window_hours)
    }

    /// Append a log entry, best-effort. Losing an entry must never fail
    /// the caller, so write errors are only traced.
    async fn log(&self, entry: RecoveryLogEntry) {
        if let Err(e) = db::recovery_log::append_entry(&self.db, &entry).await {
            warn!(
                target_id = %entry.target,
                event = %entry.event_type,
                error = %e,
                "Failed to write recovery log entry"
            );
        }
    }

    /// Tenant/content context for log enrichment, best-effort
    async fn item_context(&self, item_id: Uuid) -> serde_json::Value {
        match db::items::get_item(&self.db, item_id).await {
            Ok(Some(item)) => serde_json::json!({
                "phase": item.current_phase,
                "site_id": item.site_id,
                "locale": item.locale,
                "keyword": item.keyword,
            }),
            Ok(None) => serde_json::Value::Null,
            Err(e) => {
                warn!(item_id = %item_id, error = %e, "Could not load item for log context");
                serde_json::Value::Null
            }
        }
    }
}
