//! Read-only production item inspection

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::ProductionItem;
use crate::{db, AppState};

/// GET /items/:id
pub async fn get_item(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> ApiResult<Json<ProductionItem>> {
    match db::items::get_item(&state.db, item_id).await? {
        Some(item) => Ok(Json(item)),
        None => Err(ApiError::NotFound(format!("No item with id {}", item_id))),
    }
}

/// Build item routes
pub fn item_routes() -> Router<AppState> {
    Router::new().route("/items/:id", get(get_item))
}
