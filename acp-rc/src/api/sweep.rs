//! Sweep endpoint, driven by the external job scheduler

use axum::{extract::Query, extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SweepQuery {
    #[serde(default)]
    pub site_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SweepResponse {
    /// Items actually reset by this pass
    pub recovered: usize,
}

/// POST /sweep?site_id=
pub async fn run_sweep(
    State(state): State<AppState>,
    Query(query): Query<SweepQuery>,
) -> Json<SweepResponse> {
    let recovered = state.engine.run_sweep(query.site_id.as_deref()).await;
    Json(SweepResponse { recovered })
}

/// Build sweep routes
pub fn sweep_routes() -> Router<AppState> {
    Router::new().route("/sweep", post(run_sweep))
}
