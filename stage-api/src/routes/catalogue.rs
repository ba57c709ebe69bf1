//! Catalogue listing endpoint

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use stage_core::StageError;
use tracing::{error, info};

use super::error_response;
use crate::AppState;

/// Default and upper bound for listing size
const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 500;

/// Query parameters for the catalogue listing
#[derive(Debug, Deserialize)]
pub struct CatalogueQuery {
    /// Maximum number of results
    pub limit: Option<usize>,
}

/// Create catalogue routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/data", get(list_items))
}

/// GET /api/data - Performances to choose from (no embeddings)
async fn list_items(
    State(state): State<AppState>,
    Query(params): Query<CatalogueQuery>,
) -> impl IntoResponse {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let store = state.store.clone();

    let result = tokio::task::spawn_blocking(move || store.list_items(limit))
        .await
        .map_err(|e| StageError::internal(format!("Listing task failed: {}", e)))
        .and_then(|items| items.map_err(StageError::from));

    match result {
        Ok(items) => {
            info!("Returning {} performances", items.len());
            (StatusCode::OK, Json(items)).into_response()
        }
        Err(e) => {
            error!("Failed to list performances: {}", e);
            error_response(&e)
        }
    }
}
