//! Recommendation endpoint

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use stage_core::StageError;
use stage_embedding::{EmbeddingError, RecordStore, Recommendation, Recommender};
use tracing::{error, info, warn};

use super::{error_response, ErrorResponse};
use crate::AppState;

/// Query parameters for a recommendation request
#[derive(Debug, Deserialize)]
pub struct UserSelectQuery {
    /// Comma-separated ids of the selected performances
    #[serde(default)]
    pub plays: String,
    /// Return the full report (skipped selections, excluded candidates)
    #[serde(default)]
    pub detail: bool,
}

/// Create recommendation routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/userselect", get(user_select))
}

/// Split `a,b, c,,` into `["a", "b", "c"]`
pub fn parse_selected_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

fn recommend_blocking(
    store: &dyn RecordStore,
    recommender: &Recommender,
    selected: &[String],
) -> Result<Recommendation, StageError> {
    let queries = store.fetch_by_ids(selected)?;
    let pool = store.fetch_pool()?;

    let recommendation = recommender
        .recommend_with_queries(selected, &queries, &pool)
        .map_err(EmbeddingError::from)?;

    Ok(recommendation)
}

/// GET /userselect?plays=id1,id2 - Most similar running performance per pick
async fn user_select(
    State(state): State<AppState>,
    Query(params): Query<UserSelectQuery>,
) -> impl IntoResponse {
    let selected = parse_selected_ids(&params.plays);
    if selected.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "No plays selected".to_string(),
            }),
        )
            .into_response();
    }

    info!("Recommending for {} selected plays", selected.len());

    let store = Arc::clone(&state.store);
    let recommender = Arc::clone(&state.recommender);
    let result = tokio::task::spawn_blocking(move || {
        recommend_blocking(store.as_ref(), &recommender, &selected)
    })
    .await
    .map_err(|e| StageError::internal(format!("Recommendation task failed: {}", e)))
    .and_then(|outcome| outcome);

    match result {
        Ok(recommendation) => {
            for skipped in &recommendation.skipped {
                warn!(id = %skipped.id, reason = ?skipped.reason, "Selection produced no recommendation");
            }
            info!("Returning {} recommendations", recommendation.matches.len());

            if params.detail {
                (StatusCode::OK, Json(recommendation)).into_response()
            } else {
                (StatusCode::OK, Json(recommendation.matches)).into_response()
            }
        }
        Err(e) => {
            error!("Failed to recommend: {}", e);
            error_response(&e)
        }
    }
}
