//! Recovery log entry: the append-only audit trail of recovery decisions
//!
//! Entries are created once and never mutated. They are both the audit
//! trail and the loop-prevention mechanism: the guard queries them by
//! `target` + trailing window before any automatic reset.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What kind of event produced a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryEventType {
    /// A single item failed a phase
    PipelineFailure,
    /// An entire scheduled run crashed
    CronFailure,
    /// A completed item failed to transition to published
    PromotionFailure,
    /// The engine reset an item automatically
    AutoRecovery,
    /// A scheduled sweep batch summary
    TargetedSweep,
    /// Topic backlog fell below the low-water mark
    TopicBacklogAlert,
}

/// How the event was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryOutcome {
    /// Item was reset and will re-enter production
    Recovered,
    /// Left alone; the natural retry or the caller's own logic handles it
    WillRetry,
    /// Requires a human (credentials, content quality)
    NotRecoverable,
    /// Recorded for observability only, no action taken
    Logged,
    /// Escalation: an operator should look now
    CriticalAlert,
}

/// Classified failure category, see the classifier's signature table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Malformed or truncated JSON from a generation call
    JsonParse,
    /// Call exceeded its time budget
    Timeout,
    /// Provider rate limiting (HTTP 429)
    RateLimit,
    /// Connection-level failure
    Network,
    /// Credential failure (401/403); never auto-recovered
    Auth,
    /// Constraint violation in the store; promotion hook handles specially
    DataIntegrity,
    /// Article scored below the quality threshold; not auto-fixable
    Quality,
    /// No signature matched; treated optimistically as retryable
    Unknown,
}

impl ErrorCategory {
    /// Whether the pipeline hook may reset an item for this category.
    ///
    /// `Auth` and `Quality` need a human. `DataIntegrity` is excluded here
    /// because its remediation is promotion-specific; in the pipeline path
    /// it falls through to the optimistic catch-all.
    pub fn is_auto_recoverable(&self) -> bool {
        matches!(
            self,
            ErrorCategory::JsonParse
                | ErrorCategory::Timeout
                | ErrorCategory::RateLimit
                | ErrorCategory::Network
                | ErrorCategory::Unknown
        )
    }

    /// Categories the engine will never touch automatically
    pub fn requires_human(&self) -> bool {
        matches!(self, ErrorCategory::Auth | ErrorCategory::Quality)
    }
}

/// How a reset is performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryStrategy {
    /// Same phase, plain retry
    Retry,
    /// Same phase; downstream worker applies JSON repair on the next call
    JsonRepair,
    /// One phase back so upstream data is regenerated
    Reprocess,
}

macro_rules! snake_case_display {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                // serde produces the quoted snake_case token
                let s = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(s.trim_matches('"'))
            }
        }

        impl FromStr for $ty {
            type Err = acp_common::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                serde_json::from_value(serde_json::Value::String(s.to_string()))
                    .map_err(|_| acp_common::Error::InvalidInput(format!("Unknown token: {}", s)))
            }
        }
    };
}

snake_case_display!(RecoveryEventType);
snake_case_display!(RecoveryOutcome);
snake_case_display!(ErrorCategory);
snake_case_display!(RecoveryStrategy);

/// One recovery decision, as persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryLogEntry {
    /// What happened
    pub event_type: RecoveryEventType,

    /// Job/component name that raised the failure
    pub source: String,

    /// Subject identifier: item id, or job name for job-level events.
    /// The only machine-parsed field (loop-guard dedup queries it).
    pub target: String,

    /// Raw failure text as received (truncated for storage)
    pub failure_description: String,

    /// Human-readable explanation of the decision taken
    pub diagnosis: String,

    /// Classified category of the failure
    pub error_category: ErrorCategory,

    /// Description of the mutation performed, None if none
    pub fix_applied: Option<String>,

    /// Non-null iff the item was actually reset
    pub reactivated_at: Option<DateTime<Utc>>,

    /// Resolution of the event
    pub outcome: RecoveryOutcome,

    /// Free-form enrichment: phase, site, locale, keyword, strategy
    pub context: serde_json::Value,

    /// Insertion time
    pub created_at: DateTime<Utc>,
}

impl RecoveryLogEntry {
    /// New entry with no mutation recorded
    pub fn new(
        event_type: RecoveryEventType,
        source: &str,
        target: &str,
        failure_description: &str,
        diagnosis: &str,
        error_category: ErrorCategory,
        outcome: RecoveryOutcome,
    ) -> Self {
        Self {
            event_type,
            source: source.to_string(),
            target: target.to_string(),
            failure_description: truncate(failure_description, 500),
            diagnosis: diagnosis.to_string(),
            error_category,
            fix_applied: None,
            reactivated_at: None,
            outcome,
            context: serde_json::Value::Null,
            created_at: Utc::now(),
        }
    }

    /// Record the mutation that was performed
    pub fn with_fix(mut self, fix_applied: &str, reactivated_at: DateTime<Utc>) -> Self {
        self.fix_applied = Some(fix_applied.to_string());
        self.reactivated_at = Some(reactivated_at);
        self
    }

    /// Describe a fix that did not reactivate the subject itself (e.g. a
    /// sweep run on behalf of a crashed job)
    pub fn with_fix_text(mut self, fix_applied: &str) -> Self {
        self.fix_applied = Some(fix_applied.to_string());
        self
    }

    /// Attach enrichment context
    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = context;
        self
    }
}

/// Truncate on a char boundary for storage
fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}
