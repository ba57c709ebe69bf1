//! Stage Recommender API Server
//!
//! HTTP API server that recommends running performances similar to the ones
//! a user picked.

mod config;
mod routes;

use axum::{
    http::{header, Method},
    Router,
};
use stage_embedding::{RecordStore, Recommender, RecommenderConfig, SqliteRecordStore};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::ServerConfig;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub recommender: Arc<Recommender>,
}

/// Build the full router with CORS and request tracing
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .merge(routes::root_routes())
        .nest("/api", routes::api_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env.local file
    if let Err(e) = dotenvy::from_filename(".env.local") {
        // Not an error if the file doesn't exist
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env.local: {}", e);
        }
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("info,stage_api=debug,stage_embedding=debug,tower_http=info")
            }),
        )
        .init();

    info!("Starting Stage Recommender API");

    let server_config = ServerConfig::from_env()?;
    let recommender_config = RecommenderConfig::from_env()?;
    info!(
        "Recommender: top_k={}, expected_dimension={:?}, parallel={}",
        recommender_config.top_k, recommender_config.expected_dimension, recommender_config.use_parallel
    );

    if let Some(parent) = server_config.database_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    info!("Opening record store at: {:?}", server_config.database_path);
    let store = SqliteRecordStore::new(&server_config.database_path)?
        .with_running_state(server_config.running_state.clone());

    let state = AppState {
        store: Arc::new(store),
        recommender: Arc::new(Recommender::new(recommender_config)?),
    };

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], server_config.port));
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
