//! Data models for acp-rc (Recovery Controller service)

pub mod item;
pub mod recovery_log;

pub use item::ProductionItem;
pub use recovery_log::{
    ErrorCategory, RecoveryEventType, RecoveryLogEntry, RecoveryOutcome, RecoveryStrategy,
};
