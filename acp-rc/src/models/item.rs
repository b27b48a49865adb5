//! Production item: the unit flowing through the pipeline

use acp_common::Phase;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One article moving through the production phases.
///
/// `current_phase` is written by phase workers (forward progress) and by the
/// recovery engine (reset); nothing else mutates it. `phase_attempts` counts
/// consecutive failures at the current phase — phase workers reject an item
/// once it reaches 3, which is the precondition behind `was_rejected = true`
/// in the pipeline failure hook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionItem {
    /// Unique item identifier, immutable
    pub id: Uuid,

    /// Owning tenant site
    pub site_id: String,

    /// Content locale, e.g. "en-US"
    pub locale: String,

    /// Target keyword the article is produced for
    pub keyword: String,

    /// Current phase (or pseudo-phase `published`/`rejected`)
    pub current_phase: Phase,

    /// Consecutive failures at `current_phase`; zeroed on advance or reset
    pub phase_attempts: i64,

    /// Most recent failure text, cleared on recovery
    pub last_error: Option<String>,

    /// Why the item was rejected, cleared on recovery
    pub rejection_reason: Option<String>,

    /// Refreshed whenever the phase changes, forward or via reset
    pub phase_started_at: DateTime<Utc>,

    /// Set on entering `published` or `rejected`, cleared on recovery
    pub completed_at: Option<DateTime<Utc>>,
}

impl ProductionItem {
    /// New item at the start of the chain
    pub fn new(site_id: &str, locale: &str, keyword: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            site_id: site_id.to_string(),
            locale: locale.to_string(),
            keyword: keyword.to_string(),
            current_phase: Phase::Research,
            phase_attempts: 0,
            last_error: None,
            rejection_reason: None,
            phase_started_at: Utc::now(),
            completed_at: None,
        }
    }
}
