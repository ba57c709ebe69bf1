//! Error types for embedding operations

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EmbeddingError>;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Failure to turn a serialized embedding into a vector
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Malformed embedding: {0}")]
    Malformed(String),

    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Failure to compare two vectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScoreError {
    #[error("Vector has zero norm")]
    ZeroNorm,

    #[error("Vectors differ in dimension ({0} vs {1})")]
    DimensionMismatch(usize, usize),
}

impl From<EmbeddingError> for stage_core::StageError {
    fn from(err: EmbeddingError) -> Self {
        match err {
            EmbeddingError::Decode(e) => stage_core::StageError::parse(e.to_string()),
            EmbeddingError::Database(msg) => stage_core::StageError::storage(msg),
            EmbeddingError::Config(msg) => stage_core::StageError::config(msg),
        }
    }
}
