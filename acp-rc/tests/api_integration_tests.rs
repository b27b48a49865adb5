//! Integration tests for the acp-rc HTTP API

mod common;

use acp_common::Phase;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use chrono::Utc;
use common::{insert_rejected_item, reload, test_engine, test_pool};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower::util::ServiceExt;

/// Test helper: router over an in-memory database
async fn create_test_app() -> (axum::Router, SqlitePool) {
    let pool = test_pool().await;
    let engine = test_engine(&pool);
    let state = acp_rc::AppState::new(pool.clone(), engine);
    (acp_rc::build_router(state), pool)
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let (app, _pool) = create_test_app().await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "acp-rc");
}

#[tokio::test]
async fn pipeline_failure_hook_returns_accepted_and_resets() {
    let (app, pool) = create_test_app().await;
    let item = insert_rejected_item(
        &pool,
        "site-a",
        "drafting failed: Unterminated string in JSON",
        Utc::now(),
    )
    .await;

    let response = app
        .oneshot(json_request(
            "/hooks/pipeline-failure",
            json!({
                "item_id": item.id,
                "phase": "drafting",
                "error_text": "Unterminated string in JSON at position 42",
                "attempt_number": 3,
                "was_rejected": true,
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(reload(&pool, item.id).await.current_phase, Phase::Drafting);
}

#[tokio::test]
async fn promotion_failure_hook_returns_accepted() {
    let (app, _pool) = create_test_app().await;

    let response = app
        .oneshot(json_request(
            "/hooks/promotion-failure",
            json!({
                "item_id": uuid::Uuid::new_v4(),
                "error_text": "UNIQUE constraint failed: articles.slug",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn cron_failure_hook_returns_accepted() {
    let (app, _pool) = create_test_app().await;

    let response = app
        .oneshot(json_request(
            "/hooks/cron-failure",
            json!({
                "job_name": "seo-audit",
                "error_text": "request timed out",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn sweep_endpoint_returns_recovered_count() {
    let (app, pool) = create_test_app().await;
    insert_rejected_item(&pool, "site-a", "drafting failed: request timed out", Utc::now()).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/sweep")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["recovered"], 1);
}

#[tokio::test]
async fn recovery_log_feed_filters_by_outcome() {
    let (app, pool) = create_test_app().await;
    let engine = test_engine(&pool);
    let item = insert_rejected_item(
        &pool,
        "site-a",
        "drafting failed: 403 invalid api key",
        Utc::now(),
    )
    .await;
    engine
        .on_pipeline_failure(item.id, Phase::Drafting, "403 invalid api key", 3, true)
        .await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/recovery-log?outcome=not_recoverable")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["outcome"], "not_recoverable");
    assert_eq!(entries[0]["target"], item.id.to_string());
}

#[tokio::test]
async fn recovery_log_feed_rejects_bad_filter() {
    let (app, _pool) = create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/recovery-log?outcome=nonsense")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn item_lookup_returns_404_for_unknown_id() {
    let (app, _pool) = create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/items/{}", uuid::Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn item_lookup_returns_the_item() {
    let (app, pool) = create_test_app().await;
    let item = insert_rejected_item(&pool, "site-a", "drafting failed", Utc::now()).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/items/{}", item.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["id"], item.id.to_string());
    assert_eq!(body["current_phase"], "rejected");
}
