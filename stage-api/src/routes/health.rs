//! Health check endpoints

use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use serde::Serialize;
use tracing::error;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    items: Option<usize>,
}

/// Health check handler
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let store = state.store.clone();
    let count = tokio::task::spawn_blocking(move || store.count()).await;

    match count {
        Ok(Ok(items)) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy".to_string(),
                items: Some(items),
            }),
        ),
        Ok(Err(e)) => {
            error!("Record store unavailable: {}", e);
            degraded()
        }
        Err(e) => {
            error!("Health check task failed: {}", e);
            degraded()
        }
    }
}

fn degraded() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(HealthResponse {
            status: "degraded".to_string(),
            items: None,
        }),
    )
}

/// Simple liveness check (always returns OK if server is running)
async fn liveness() -> &'static str {
    "OK"
}

/// Create health routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness))
}

/// Liveness at `/`
pub fn root_routes() -> Router<AppState> {
    Router::new().route("/", get(liveness))
}
