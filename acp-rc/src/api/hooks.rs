//! Failure hook endpoints
//!
//! All three return 202 Accepted unconditionally once the body parses:
//! the hooks are fire-and-forget and must never fail their caller.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use acp_common::Phase;
use serde::Deserialize;
use uuid::Uuid;

use crate::AppState;

/// Body for POST /hooks/pipeline-failure
#[derive(Debug, Deserialize)]
pub struct PipelineFailureRequest {
    pub item_id: Uuid,
    pub phase: Phase,
    pub error_text: String,
    pub attempt_number: i64,
    pub was_rejected: bool,
}

/// Body for POST /hooks/promotion-failure
#[derive(Debug, Deserialize)]
pub struct PromotionFailureRequest {
    pub item_id: Uuid,
    pub error_text: String,
}

/// Body for POST /hooks/cron-failure
#[derive(Debug, Deserialize)]
pub struct CronFailureRequest {
    pub job_name: String,
    pub error_text: String,
    #[serde(default)]
    pub site_id: Option<String>,
}

/// POST /hooks/pipeline-failure
pub async fn pipeline_failure(
    State(state): State<AppState>,
    Json(req): Json<PipelineFailureRequest>,
) -> StatusCode {
    state
        .engine
        .on_pipeline_failure(
            req.item_id,
            req.phase,
            &req.error_text,
            req.attempt_number,
            req.was_rejected,
        )
        .await;
    StatusCode::ACCEPTED
}

/// POST /hooks/promotion-failure
pub async fn promotion_failure(
    State(state): State<AppState>,
    Json(req): Json<PromotionFailureRequest>,
) -> StatusCode {
    state
        .engine
        .on_promotion_failure(req.item_id, &req.error_text)
        .await;
    StatusCode::ACCEPTED
}

/// POST /hooks/cron-failure
pub async fn cron_failure(
    State(state): State<AppState>,
    Json(req): Json<CronFailureRequest>,
) -> StatusCode {
    state
        .engine
        .on_cron_failure(&req.job_name, &req.error_text, req.site_id.as_deref())
        .await;
    StatusCode::ACCEPTED
}

/// Build hook routes
pub fn hook_routes() -> Router<AppState> {
    Router::new()
        .route("/hooks/pipeline-failure", post(pipeline_failure))
        .route("/hooks/promotion-failure", post(promotion_failure))
        .route("/hooks/cron-failure", post(cron_failure))
}
