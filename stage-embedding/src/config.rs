//! Recommender configuration

use std::env;

use serde::{Deserialize, Serialize};

use crate::error::{EmbeddingError, Result};

/// Configuration for a [`crate::Recommender`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommenderConfig {
    /// Matches kept per selection (1 = single nearest neighbour)
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Authoritative embedding dimension; `None` lets each batch establish it
    #[serde(default)]
    pub expected_dimension: Option<usize>,
    /// Spread selections and pool chunks over the rayon thread pool
    #[serde(default)]
    pub use_parallel: bool,
    /// Candidates per parallel chunk
    #[serde(default = "default_chunk_size")]
    pub parallel_chunk_size: usize,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            expected_dimension: None,
            use_parallel: false,
            parallel_chunk_size: default_chunk_size(),
        }
    }
}

impl RecommenderConfig {
    /// Load configuration from environment variables
    ///
    /// Reads (all optional):
    /// - RECO_TOP_K: matches per selection
    /// - RECO_EXPECTED_DIM: authoritative embedding dimension
    /// - RECO_PARALLEL: "true"/"1" to enable parallel matching
    /// - RECO_CHUNK_SIZE: candidates per parallel chunk
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(top_k) = read_var::<usize>("RECO_TOP_K")? {
            config.top_k = top_k;
        }
        if let Some(dimension) = read_var::<usize>("RECO_EXPECTED_DIM")? {
            config.expected_dimension = Some(dimension);
        }
        if let Ok(raw) = env::var("RECO_PARALLEL") {
            config.use_parallel = parse_flag("RECO_PARALLEL", &raw)?;
        }
        if let Some(chunk_size) = read_var::<usize>("RECO_CHUNK_SIZE")? {
            config.parallel_chunk_size = chunk_size;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(EmbeddingError::Config("top_k must be at least 1".to_string()));
        }
        if self.expected_dimension == Some(0) {
            return Err(EmbeddingError::Config(
                "expected_dimension must be at least 1".to_string(),
            ));
        }
        if self.parallel_chunk_size == 0 {
            return Err(EmbeddingError::Config(
                "parallel_chunk_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn read_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| EmbeddingError::Config(format!("Invalid value for {}: {:?}", name, raw))),
        Err(_) => Ok(None),
    }
}

fn parse_flag(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(EmbeddingError::Config(format!("Invalid value for {}: {:?}", name, raw))),
    }
}

fn default_top_k() -> usize {
    1
}

fn default_chunk_size() -> usize {
    1024
}
