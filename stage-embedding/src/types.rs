//! Core types for embeddings

use stage_core::{ItemRow, MatchResult};

/// Decoded embedding vector
pub type EmbeddingVector = Vec<f64>;

/// A catalogue row whose embedding decoded successfully
#[derive(Debug, Clone)]
pub struct DecodedItem<'a> {
    /// Row as supplied by the record store
    pub row: &'a ItemRow,
    /// The decoded vector (batch dimension)
    pub embedding: EmbeddingVector,
}

impl<'a> DecodedItem<'a> {
    pub fn new(row: &'a ItemRow, embedding: EmbeddingVector) -> Self {
        Self { row, embedding }
    }

    pub fn id(&self) -> &'a str {
        &self.row.id
    }

    pub fn to_match(&self) -> MatchResult {
        self.row.summary()
    }
}

/// Ranked position of a candidate inside the pool it was scored against
///
/// `index` is the candidate's position in pool order and breaks score ties.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredCandidate {
    pub index: usize,
    pub score: f64,
}

impl ScoredCandidate {
    /// Strictly better: higher score, or equal score and earlier in the pool
    pub fn outranks(&self, other: &ScoredCandidate) -> bool {
        self.score > other.score || (self.score == other.score && self.index < other.index)
    }
}
