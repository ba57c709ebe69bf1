//! Recommendation entry point
//!
//! Decodes every embedding in the batch once, then runs the nearest-match
//! aggregation for the selected ids. Per-row decode failures degrade to
//! "this row contributes nothing"; the whole batch fails only when no row
//! at all has the configured dimension.

use serde::Serialize;
use stage_core::{ItemRow, MatchResult};
use tracing::{debug, info, instrument, warn};

use crate::{
    aggregator::{aggregate, SelectionLookup, SkippedSelection},
    config::RecommenderConfig,
    decode::VectorDecoder,
    error::{DecodeError, Result},
    matcher::NearestMatcher,
    types::DecodedItem,
};

/// Full outcome of one batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    /// Recommended items, first-discovery order, no duplicates
    pub matches: Vec<MatchResult>,
    /// Selections that could not be matched at all
    pub skipped: Vec<SkippedSelection>,
    /// Candidate rows dropped from the pool because they did not decode
    pub excluded_candidates: usize,
}

/// Embedding-based recommender
#[derive(Debug, Clone)]
pub struct Recommender {
    config: RecommenderConfig,
    matcher: NearestMatcher,
}

impl Default for Recommender {
    fn default() -> Self {
        Self {
            config: RecommenderConfig::default(),
            matcher: NearestMatcher::default(),
        }
    }
}

impl Recommender {
    pub fn new(config: RecommenderConfig) -> Result<Self> {
        config.validate()?;

        let mut matcher = NearestMatcher::new(config.top_k);
        if config.use_parallel {
            matcher = matcher.with_parallel_chunks(config.parallel_chunk_size);
        }

        Ok(Self { config, matcher })
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    /// Recommend items for `selected_ids`, resolving each selection's
    /// embedding from the candidate pool itself
    pub fn recommend(
        &self,
        selected_ids: &[String],
        pool: &[ItemRow],
    ) -> std::result::Result<Vec<MatchResult>, DecodeError> {
        self.recommend_with_queries(selected_ids, &[], pool)
            .map(|recommendation| recommendation.matches)
    }

    /// Recommend items for `selected_ids`
    ///
    /// `queries` holds rows for the selected items fetched independently of
    /// the pool filter (a selection need not be a candidate itself). They are
    /// consulted first; the pool is the fallback.
    #[instrument(
        skip_all,
        fields(selections = selected_ids.len(), queries = queries.len(), candidates = pool.len())
    )]
    pub fn recommend_with_queries(
        &self,
        selected_ids: &[String],
        queries: &[ItemRow],
        pool: &[ItemRow],
    ) -> std::result::Result<Recommendation, DecodeError> {
        if selected_ids.is_empty() || pool.is_empty() {
            debug!("Nothing to match");
            return Ok(Recommendation::default());
        }

        let mut decoder = match self.config.expected_dimension {
            Some(dimension) => VectorDecoder::with_dimension(dimension),
            None => VectorDecoder::new(),
        };

        // The pool is decoded first, so its first valid row establishes D
        let (candidates, rejected_candidates) = decode_rows(&mut decoder, pool);
        let (query_items, rejected_queries) = decode_rows(&mut decoder, queries);
        decoder.check_override()?;

        for (row, error) in &rejected_candidates {
            warn!(id = %row.id, %error, "Excluding candidate with undecodable embedding");
        }

        let mut lookup = SelectionLookup::new();
        lookup.add_decoded(&query_items);
        lookup.add_decoded(&candidates);
        for (row, error) in rejected_queries.into_iter().chain(rejected_candidates.iter().cloned()) {
            lookup.add_rejected(&row.id, error);
        }

        let aggregation = aggregate(
            selected_ids,
            &lookup,
            &candidates,
            &self.matcher,
            self.config.use_parallel,
        );

        // Dropped selections stay non-fatal; they are reported, not raised
        if !aggregation.skipped.is_empty() {
            info!(
                skipped = aggregation.skipped.len(),
                "Some selections produced no recommendation"
            );
        }

        info!(
            matches = aggregation.matches.len(),
            dimension = ?decoder.dimension(),
            "Recommendation complete"
        );

        Ok(Recommendation {
            matches: aggregation.matches,
            skipped: aggregation.skipped,
            excluded_candidates: rejected_candidates.len(),
        })
    }
}

fn decode_rows<'a>(
    decoder: &mut VectorDecoder,
    rows: &'a [ItemRow],
) -> (Vec<DecodedItem<'a>>, Vec<(&'a ItemRow, DecodeError)>) {
    let mut decoded = Vec::with_capacity(rows.len());
    let mut rejected = Vec::new();

    for row in rows {
        match decoder.decode(&row.embedding) {
            Ok(embedding) => decoded.push(DecodedItem::new(row, embedding)),
            Err(error) => rejected.push((row, error)),
        }
    }

    (decoded, rejected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::SkipReason;
    use stage_core::DisplayFields;

    fn item(id: &str, embedding: &str) -> ItemRow {
        ItemRow::new(id, DisplayFields::new(id), embedding)
    }

    fn selected(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn match_ids(matches: &[MatchResult]) -> Vec<&str> {
        matches.iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn test_single_selection_scenario() {
        let pool = vec![item("A", "[1, 0]"), item("B", "[1, 0]"), item("C", "[0, 1]")];
        let matches = Recommender::default().recommend(&selected(&["A"]), &pool).unwrap();

        assert_eq!(match_ids(&matches), vec!["B"]);
    }

    #[test]
    fn test_shared_best_match_is_deduplicated() {
        let pool = vec![
            item("A", "[1, 0.1]"),
            item("B", "[1, 0]"),
            item("C", "[0, 1]"),
            item("D", "[1, -0.1]"),
        ];
        let matches = Recommender::default()
            .recommend(&selected(&["A", "D"]), &pool)
            .unwrap();

        assert_eq!(match_ids(&matches), vec!["B"]);
    }

    #[test]
    fn test_malformed_candidate_is_excluded() {
        let pool = vec![
            item("A", "[1, 0]"),
            item("E", "not-a-list"),
            item("B", "[0.9, 0.1]"),
            item("C", "[0, 1]"),
        ];
        let recommendation = Recommender::default()
            .recommend_with_queries(&selected(&["A", "E", "C"]), &[], &pool)
            .unwrap();

        assert_eq!(match_ids(&recommendation.matches), vec!["B"]);
        assert_eq!(recommendation.excluded_candidates, 1);
        assert_eq!(recommendation.skipped.len(), 1);
        assert_eq!(recommendation.skipped[0].id, "E");
        assert!(matches!(recommendation.skipped[0].reason, SkipReason::Undecodable(_)));
    }

    #[test]
    fn test_dimension_outlier_is_excluded_not_fatal() {
        let pool = vec![item("A", "[1, 0]"), item("X", "[1, 0, 0]"), item("B", "[0.5, 0.5]")];
        let recommendation = Recommender::default()
            .recommend_with_queries(&selected(&["A"]), &[], &pool)
            .unwrap();

        assert_eq!(match_ids(&recommendation.matches), vec!["B"]);
        assert_eq!(recommendation.excluded_candidates, 1);
    }

    #[test]
    fn test_queries_resolve_selections_outside_the_pool() {
        let queries = vec![item("OLD", "[0, 1]")];
        let pool = vec![item("A", "[1, 0]"), item("B", "[0.1, 1]")];
        let recommendation = Recommender::default()
            .recommend_with_queries(&selected(&["OLD", "MISSING"]), &queries, &pool)
            .unwrap();

        assert_eq!(match_ids(&recommendation.matches), vec!["B"]);
        assert_eq!(recommendation.skipped[0].id, "MISSING");
        assert_eq!(recommendation.skipped[0].reason, SkipReason::NotFound);
    }

    #[test]
    fn test_override_mismatch_fails_the_batch() {
        let recommender = Recommender::new(RecommenderConfig {
            expected_dimension: Some(3),
            ..RecommenderConfig::default()
        })
        .unwrap();
        let pool = vec![item("A", "[1, 0]"), item("B", "[0, 1]")];

        assert_eq!(
            recommender.recommend(&selected(&["A"]), &pool),
            Err(DecodeError::DimensionMismatch { expected: 3, actual: 2 })
        );
    }

    #[test]
    fn test_override_outlier_is_excluded_regardless_of_position() {
        let recommender = Recommender::new(RecommenderConfig {
            expected_dimension: Some(4),
            ..RecommenderConfig::default()
        })
        .unwrap();
        let x = item("X", "[1, 2]");
        let a = item("A", "[1, 0, 0, 0]");
        let b = item("B", "[0.9, 0.1, 0, 0]");

        for pool in [
            vec![x.clone(), a.clone(), b.clone()],
            vec![a.clone(), x.clone(), b.clone()],
            vec![a.clone(), b.clone(), x.clone()],
        ] {
            let recommendation = recommender
                .recommend_with_queries(&selected(&["A"]), &[], &pool)
                .unwrap();
            assert_eq!(match_ids(&recommendation.matches), vec!["B"]);
            assert_eq!(recommendation.excluded_candidates, 1);
        }
    }

    #[test]
    fn test_tiny_magnitude_is_still_a_direction() {
        let pool = vec![
            item("A", "[1, 0]"),
            item("FAR", "[0, 1]"),
            item("TINY", "[1e-200, 0]"),
        ];
        let matches = Recommender::default().recommend(&selected(&["A"]), &pool).unwrap();

        assert_eq!(match_ids(&matches), vec!["TINY"]);
    }

    #[test]
    fn test_empty_inputs_are_not_errors() {
        let recommender = Recommender::default();
        let pool = vec![item("A", "[1, 0]")];

        assert!(recommender.recommend(&[], &pool).unwrap().is_empty());
        assert!(recommender.recommend(&selected(&["A"]), &[]).unwrap().is_empty());
    }

    #[test]
    fn test_top_k_config_widens_each_selection() {
        let recommender = Recommender::new(RecommenderConfig {
            top_k: 2,
            ..RecommenderConfig::default()
        })
        .unwrap();
        let pool = vec![
            item("A", "[1, 0]"),
            item("B", "[1, 0.2]"),
            item("C", "[1, 0.5]"),
            item("D", "[0, 1]"),
        ];

        let matches = recommender.recommend(&selected(&["A", "D"]), &pool).unwrap();
        assert_eq!(match_ids(&matches), vec!["B", "C"]);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let result = Recommender::new(RecommenderConfig {
            top_k: 0,
            ..RecommenderConfig::default()
        });
        assert!(result.is_err());
    }
}
