//! Error classifier
//!
//! Turns raw failure text from a generation call into an actionable
//! category. Pure and total: any input maps to exactly one category,
//! nothing here can fail.

use crate::models::ErrorCategory;

/// Ordered signature table. First match wins; evaluation order is part of
/// the contract (e.g. "unexpected token" classifies as JSON before any
/// later pattern could see it).
const SIGNATURES: &[(&[&str], ErrorCategory)] = &[
    (
        &["json", "unterminated string", "unexpected token", "unexpected end"],
        ErrorCategory::JsonParse,
    ),
    (
        &["timeout", "budget", "timed out", "aborted"],
        ErrorCategory::Timeout,
    ),
    (
        &["rate limit", "429", "too many requests"],
        ErrorCategory::RateLimit,
    ),
    (
        &["network", "econnrefused", "fetch failed", "socket"],
        ErrorCategory::Network,
    ),
    (
        &["api key", "unauthorized", "401", "403"],
        ErrorCategory::Auth,
    ),
    (
        &["required", "not null", "foreign key", "unique constraint", "duplicate"],
        ErrorCategory::DataIntegrity,
    ),
    (
        &["quality score", "below threshold"],
        ErrorCategory::Quality,
    ),
];

/// Classify failure text, case-insensitive substring matching
pub fn classify(error_text: &str) -> ErrorCategory {
    let lower = error_text.to_lowercase();

    for (patterns, category) in SIGNATURES {
        if patterns.iter().any(|p| lower.contains(p)) {
            return *category;
        }
    }

    ErrorCategory::Unknown
}
