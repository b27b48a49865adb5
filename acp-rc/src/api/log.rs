//! Read-only recovery log feed for dashboards

use axum::{extract::Query, extract::State, routing::get, Json, Router};
use chrono::{Duration, Utc};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::models::{RecoveryEventType, RecoveryLogEntry, RecoveryOutcome};
use crate::{db, AppState};

const DEFAULT_SINCE_HOURS: i64 = 24;
const DEFAULT_LIMIT: u32 = 100;
const MAX_LIMIT: u32 = 1000;

#[derive(Debug, Deserialize)]
pub struct LogQuery {
    /// Trailing window in hours (default 24)
    pub since_hours: Option<i64>,
    /// Filter by event type token, e.g. "auto_recovery"
    pub event_type: Option<String>,
    /// Filter by outcome token, e.g. "recovered"
    pub outcome: Option<String>,
    /// Maximum entries returned (default 100, capped at 1000)
    pub limit: Option<u32>,
}

/// GET /recovery-log
pub async fn query_log(
    State(state): State<AppState>,
    Query(query): Query<LogQuery>,
) -> ApiResult<Json<Vec<RecoveryLogEntry>>> {
    let since_hours = query.since_hours.unwrap_or(DEFAULT_SINCE_HOURS);
    if since_hours <= 0 {
        return Err(ApiError::BadRequest("since_hours must be positive".to_string()));
    }
    let since = Utc::now() - Duration::hours(since_hours);

    let event_type = query
        .event_type
        .as_deref()
        .map(|s| s.parse::<RecoveryEventType>())
        .transpose()?;
    let outcome = query
        .outcome
        .as_deref()
        .map(|s| s.parse::<RecoveryOutcome>())
        .transpose()?;
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);

    let entries = db::recovery_log::query_entries(&state.db, since, event_type, outcome, limit).await?;
    Ok(Json(entries))
}

/// Build recovery log routes
pub fn log_routes() -> Router<AppState> {
    Router::new().route("/recovery-log", get(query_log))
}
