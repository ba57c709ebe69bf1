//! Per-selection matching merged into one ordered, deduplicated result

use std::collections::HashMap;

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::Serialize;
use stage_core::MatchResult;
use tracing::debug;

use crate::{error::DecodeError, matcher::NearestMatcher, types::DecodedItem};

/// Why a selection produced no recommendation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// No row for the selected id in the batch
    NotFound,
    /// The selection's own embedding did not decode
    Undecodable(String),
}

/// A selection that contributed nothing to the result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedSelection {
    pub id: String,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Resolves selected ids to their decoded query vectors
///
/// Sources are consulted in the order they were added; the first decoded
/// row for an id wins. A decode failure only counts if no source decoded
/// the id.
#[derive(Debug, Default)]
pub struct SelectionLookup<'d, 'a> {
    resolved: HashMap<&'a str, &'d DecodedItem<'a>>,
    rejected: HashMap<&'a str, DecodeError>,
}

impl<'d, 'a> SelectionLookup<'d, 'a> {
    pub fn new() -> Self {
        Self {
            resolved: HashMap::new(),
            rejected: HashMap::new(),
        }
    }

    pub fn add_decoded(&mut self, items: &'d [DecodedItem<'a>]) {
        for item in items {
            self.resolved.entry(item.id()).or_insert(item);
        }
    }

    pub fn add_rejected(&mut self, id: &'a str, error: DecodeError) {
        self.rejected.entry(id).or_insert(error);
    }

    pub fn resolve(&self, id: &str) -> Result<&'d DecodedItem<'a>, SkipReason> {
        if let Some(item) = self.resolved.get(id) {
            return Ok(item);
        }
        match self.rejected.get(id) {
            Some(error) => Err(SkipReason::Undecodable(error.to_string())),
            None => Err(SkipReason::NotFound),
        }
    }
}

/// Insertion-ordered, first-writer-wins collection of matches
#[derive(Debug, Default)]
pub struct MatchAggregator {
    matches: IndexMap<String, MatchResult>,
    skipped: Vec<SkippedSelection>,
}

/// Output of one aggregation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Aggregation {
    /// Matches in first-discovery order
    pub matches: Vec<MatchResult>,
    /// Selections dropped without a match attempt
    pub skipped: Vec<SkippedSelection>,
}

impl MatchAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a match. Returns false if the id was already present, in which
    /// case the earlier entry is kept untouched.
    pub fn insert(&mut self, item: &DecodedItem<'_>) -> bool {
        if self.matches.contains_key(item.id()) {
            return false;
        }
        self.matches.insert(item.id().to_string(), item.to_match());
        true
    }

    pub fn skip(&mut self, id: impl Into<String>, reason: SkipReason) {
        self.skipped.push(SkippedSelection {
            id: id.into(),
            reason,
        });
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn finish(self) -> Aggregation {
        Aggregation {
            matches: self.matches.into_values().collect(),
            skipped: self.skipped,
        }
    }
}

/// Run the matcher once per selection and merge the results
///
/// Selections are matched independently (in parallel when `parallel` is set)
/// and merged strictly in selection order, so the output is the same either way.
pub fn aggregate(
    selections: &[String],
    lookup: &SelectionLookup<'_, '_>,
    pool: &[DecodedItem<'_>],
    matcher: &NearestMatcher,
    parallel: bool,
) -> Aggregation {
    let match_one = |id: &String| -> Result<Vec<usize>, SkipReason> {
        let query = lookup.resolve(id)?;
        Ok(matcher
            .best_matches(query, pool)
            .into_iter()
            .map(|candidate| candidate.index)
            .collect())
    };

    let outcomes: Vec<Result<Vec<usize>, SkipReason>> = if parallel {
        selections.par_iter().map(match_one).collect()
    } else {
        selections.iter().map(match_one).collect()
    };

    let mut aggregator = MatchAggregator::new();
    for (id, outcome) in selections.iter().zip(outcomes) {
        match outcome {
            Ok(indices) => {
                for index in indices {
                    if !aggregator.insert(&pool[index]) {
                        debug!(selection = %id, matched = pool[index].id(), "Duplicate match dropped");
                    }
                }
            }
            Err(reason) => {
                debug!(selection = %id, ?reason, "Selection skipped");
                aggregator.skip(id.as_str(), reason);
            }
        }
    }

    aggregator.finish()
}
