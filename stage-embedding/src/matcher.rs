//! Nearest-neighbour selection over a candidate pool
//!
//! Exact linear scan. The running best is replaced only on a strict
//! improvement, so among equal scores the candidate earliest in pool order
//! wins. The chunked parallel scan reduces with the same ordering and
//! returns exactly what the sequential scan returns.

use rayon::prelude::*;
use tracing::trace;

use crate::{
    similarity::ranking_score,
    types::{DecodedItem, ScoredCandidate},
};

/// Bounded, ordered list of the best candidates seen so far
#[derive(Debug, Clone)]
struct TopK {
    k: usize,
    entries: Vec<ScoredCandidate>,
}

impl TopK {
    fn new(k: usize) -> Self {
        Self {
            k,
            entries: Vec::with_capacity(k),
        }
    }

    fn offer(&mut self, candidate: ScoredCandidate) {
        // Degenerate comparisons are never selectable
        if candidate.score == f64::NEG_INFINITY {
            return;
        }

        let position = self
            .entries
            .iter()
            .position(|entry| candidate.outranks(entry))
            .unwrap_or(self.entries.len());

        if position < self.k {
            self.entries.insert(position, candidate);
            self.entries.truncate(self.k);
        }
    }

    fn merge(mut self, other: TopK) -> TopK {
        for candidate in other.entries {
            self.offer(candidate);
        }
        self
    }

    fn into_vec(self) -> Vec<ScoredCandidate> {
        self.entries
    }
}

/// Finds the most similar candidates for a query item
#[derive(Debug, Clone)]
pub struct NearestMatcher {
    top_k: usize,
    chunk_size: Option<usize>,
}

impl Default for NearestMatcher {
    fn default() -> Self {
        Self::new(1)
    }
}

impl NearestMatcher {
    /// Matcher returning up to `top_k` candidates per query (at least one)
    pub fn new(top_k: usize) -> Self {
        Self {
            top_k: top_k.max(1),
            chunk_size: None,
        }
    }

    /// Scan the pool in parallel chunks of `chunk_size` candidates
    pub fn with_parallel_chunks(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size.max(1));
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn is_parallel(&self) -> bool {
        self.chunk_size.is_some()
    }

    /// Single most similar candidate, never the query itself
    pub fn best_match<'p, 'a>(
        &self,
        query: &DecodedItem<'a>,
        pool: &'p [DecodedItem<'a>],
    ) -> Option<&'p DecodedItem<'a>> {
        self.rank(query, pool, 1)
            .first()
            .map(|candidate| &pool[candidate.index])
    }

    /// Up to `top_k` candidates, best first, ties in pool order
    pub fn best_matches(&self, query: &DecodedItem<'_>, pool: &[DecodedItem<'_>]) -> Vec<ScoredCandidate> {
        self.rank(query, pool, self.top_k)
    }

    fn rank(&self, query: &DecodedItem<'_>, pool: &[DecodedItem<'_>], k: usize) -> Vec<ScoredCandidate> {
        let query_id = query.id();
        let score_at = |index: usize, candidate: &DecodedItem<'_>| {
            (candidate.id() != query_id).then(|| ScoredCandidate {
                index,
                score: ranking_score(&query.embedding, &candidate.embedding),
            })
        };

        let ranked = match self.chunk_size {
            Some(chunk_size) if pool.len() > chunk_size => pool
                .par_chunks(chunk_size)
                .enumerate()
                .map(|(chunk_index, chunk)| {
                    let offset = chunk_index * chunk_size;
                    let mut local = TopK::new(k);
                    for (i, candidate) in chunk.iter().enumerate() {
                        if let Some(scored) = score_at(offset + i, candidate) {
                            local.offer(scored);
                        }
                    }
                    local
                })
                .reduce(|| TopK::new(k), TopK::merge),
            _ => {
                let mut best = TopK::new(k);
                for (index, candidate) in pool.iter().enumerate() {
                    if let Some(scored) = score_at(index, candidate) {
                        best.offer(scored);
                    }
                }
                best
            }
        }
        .into_vec();

        trace!(
            query = query_id,
            candidates = pool.len(),
            matched = ranked.len(),
            "Ranked candidate pool"
        );

        ranked
    }
}
