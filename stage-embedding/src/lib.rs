//! Embedding-based recommendation for stage performances
//!
//! Given the performances a user picked, this crate finds for each pick the
//! most similar other performance in the candidate pool and returns the
//! de-duplicated union of those matches.
//!
//! ## Features
//! - Decode literal-list embeddings and validate their dimension per batch
//! - Cosine similarity with a never-selected sentinel for degenerate vectors
//! - Exact nearest-neighbour scan (top-K, stable tie-break, optional rayon)
//! - Ordered, first-writer-wins aggregation of matches
//! - SQLite record store for catalogue rows

pub mod aggregator;
pub mod config;
pub mod decode;
pub mod error;
pub mod matcher;
pub mod recommender;
pub mod similarity;
pub mod store;
pub mod types;

pub use aggregator::{aggregate, Aggregation, MatchAggregator, SelectionLookup, SkipReason, SkippedSelection};
pub use config::RecommenderConfig;
pub use decode::{decode, parse_literal, VectorDecoder};
pub use error::{DecodeError, EmbeddingError, Result, ScoreError};
pub use matcher::NearestMatcher;
pub use recommender::{Recommendation, Recommender};
pub use similarity::{cosine_similarity, ranking_score};
pub use store::{RecordStore, SqliteRecordStore, DEFAULT_RUNNING_STATE};
pub use types::{DecodedItem, EmbeddingVector, ScoredCandidate};
