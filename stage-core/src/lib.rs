//! Core types for the stage performance recommender
//!
//! This crate defines the shared data structures used across the workspace:
//! catalogue rows with their serialized embeddings, the display fields
//! passed through to clients, and the workspace error type.

pub mod error;
pub mod item;

pub use error::{StageError, StageResult};
pub use item::{DisplayFields, ItemRow, ItemSummary, MatchResult};
