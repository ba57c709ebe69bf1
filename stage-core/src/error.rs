//! Error types shared across the recommender crates

use thiserror::Error;

/// Workspace-wide error type
#[derive(Error, Debug)]
pub enum StageError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StageError {
    pub fn parse(msg: impl Into<String>) -> Self {
        StageError::Parse(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        StageError::Storage(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        StageError::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        StageError::Internal(msg.into())
    }
}

/// Result type alias for recommender operations
pub type StageResult<T> = Result<T, StageError>;
