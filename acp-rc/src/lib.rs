//! acp-rc library interface
//!
//! Exposes the recovery engine, database layer and router for the binary
//! and for integration testing.

pub mod api;
pub mod db;
pub mod error;
pub mod models;
pub mod recovery;

pub use crate::error::{ApiError, ApiResult};
pub use crate::recovery::RecoveryEngine;

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Recovery engine (pool + injected policy/job tables)
    pub engine: RecoveryEngine,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, engine: RecoveryEngine) -> Self {
        Self {
            db,
            engine,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::hook_routes())
        .merge(api::sweep_routes())
        .merge(api::log_routes())
        .merge(api::item_routes())
        .merge(api::health_routes())
        .with_state(state)
}
