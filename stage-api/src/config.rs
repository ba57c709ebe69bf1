//! Server configuration loaded from the environment

use std::env;
use std::path::PathBuf;

use stage_core::{StageError, StageResult};
use stage_embedding::DEFAULT_RUNNING_STATE;

/// Listening port, database location and pool filter
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub database_path: PathBuf,
    pub running_state: String,
}

impl ServerConfig {
    /// Load server configuration from environment variables
    ///
    /// Reads (all optional):
    /// - SERVER_PORT: listening port (default 5000)
    /// - STAGE_DB_PATH: SQLite database file (default data/performances.db)
    /// - RUNNING_STATE: state value of recommendable performances
    pub fn from_env() -> StageResult<Self> {
        let port = match env::var("SERVER_PORT") {
            Ok(raw) => raw
                .trim()
                .parse()
                .map_err(|_| StageError::config(format!("Invalid SERVER_PORT: {:?}", raw)))?,
            Err(_) => 5000,
        };

        let database_path = env::var("STAGE_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data/performances.db"));

        let running_state = env::var("RUNNING_STATE")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_RUNNING_STATE.to_string());

        Ok(Self {
            port,
            database_path,
            running_state,
        })
    }
}
