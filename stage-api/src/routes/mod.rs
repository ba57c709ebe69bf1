//! API route definitions

mod catalogue;
mod health;
mod recommend;

use axum::{http::StatusCode, response::IntoResponse, Json, Router};
use serde::Serialize;
use stage_core::StageError;

use crate::AppState;

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Map a workspace error onto an HTTP status with a JSON body
pub fn error_response(err: &StageError) -> axum::response::Response {
    let status = match err {
        StageError::Parse(_) => StatusCode::UNPROCESSABLE_ENTITY,
        StageError::Storage(_) | StageError::Config(_) | StageError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

/// Routes served at the root (liveness and the recommendation endpoint)
pub fn root_routes() -> Router<AppState> {
    Router::new()
        .merge(health::root_routes())
        .merge(recommend::routes())
}

/// Create all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(catalogue::routes())
        .merge(health::routes())
}
