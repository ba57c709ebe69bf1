//! Decoding of serialized embeddings
//!
//! The record store keeps embeddings as literal lists of numbers
//! (`"[0.12, -0.04, ...]"`). JSON-compatible lists take the serde_json
//! path; tuple syntax and trailing commas fall back to a small tokenizer.

use crate::{error::DecodeError, types::EmbeddingVector};

/// Longest input prefix quoted back in error messages
const PREVIEW_CHARS: usize = 32;

/// Parse a serialized embedding without any dimension check
///
/// Rejects empty vectors and non-finite values.
pub fn parse_literal(serialized: &str) -> Result<EmbeddingVector, DecodeError> {
    let text = serialized.trim();

    let values = match serde_json::from_str::<Vec<f64>>(text) {
        Ok(values) => values,
        Err(_) => parse_sequence(text)?,
    };

    if values.is_empty() {
        return Err(DecodeError::Malformed("empty vector".to_string()));
    }

    if let Some(position) = values.iter().position(|v| !v.is_finite()) {
        return Err(DecodeError::Malformed(format!(
            "non-finite value at position {}",
            position
        )));
    }

    Ok(values)
}

/// Decode a serialized embedding, checking it against an expected dimension
pub fn decode(serialized: &str, expected: Option<usize>) -> Result<EmbeddingVector, DecodeError> {
    let vector = parse_literal(serialized)?;
    match expected {
        Some(expected) if expected != vector.len() => Err(DecodeError::DimensionMismatch {
            expected,
            actual: vector.len(),
        }),
        _ => Ok(vector),
    }
}

/// `[a, b, ...]` or `(a, b, ...)`, optional trailing comma
fn parse_sequence(text: &str) -> Result<EmbeddingVector, DecodeError> {
    let inner = text
        .strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .or_else(|| text.strip_prefix('(').and_then(|t| t.strip_suffix(')')))
        .ok_or_else(|| DecodeError::Malformed(format!("not a list: {:?}", preview(text))))?
        .trim();

    let inner = inner.strip_suffix(',').unwrap_or(inner);
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }

    inner
        .split(',')
        .map(|token| {
            let token = token.trim();
            token
                .parse::<f64>()
                .map_err(|_| DecodeError::Malformed(format!("invalid number {:?}", preview(token))))
        })
        .collect()
}

fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}

/// Per-batch decoder that establishes the batch dimension `D`
///
/// Without an override, `D` is the length of the first vector that decodes;
/// every later vector must match it. With an override (`with_dimension`),
/// `D` is fixed up front: rows of any other length are rejected one by one,
/// and [`VectorDecoder::check_override`] fails only when no row at all had
/// the overriding length.
#[derive(Debug, Clone, Default)]
pub struct VectorDecoder {
    dimension: Option<usize>,
    authoritative: bool,
    first_parsed: Option<usize>,
    matched: usize,
}

impl VectorDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoder with a caller-supplied, authoritative dimension
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension: Some(dimension),
            authoritative: true,
            ..Self::default()
        }
    }

    /// Dimension established so far
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    pub fn decode(&mut self, serialized: &str) -> Result<EmbeddingVector, DecodeError> {
        let vector = parse_literal(serialized)?;

        if self.first_parsed.is_none() {
            self.first_parsed = Some(vector.len());
        }

        match self.dimension {
            Some(expected) if expected != vector.len() => Err(DecodeError::DimensionMismatch {
                expected,
                actual: vector.len(),
            }),
            Some(_) => {
                self.matched += 1;
                Ok(vector)
            }
            None => {
                self.dimension = Some(vector.len());
                self.matched += 1;
                Ok(vector)
            }
        }
    }

    /// Batch-level check against the authoritative dimension
    ///
    /// Fails when vectors parsed but none of them had the overriding length.
    /// The result does not depend on row order.
    pub fn check_override(&self) -> Result<(), DecodeError> {
        match (self.authoritative, self.dimension, self.first_parsed) {
            (true, Some(expected), Some(actual)) if self.matched == 0 => {
                Err(DecodeError::DimensionMismatch { expected, actual })
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_list() {
        let v = parse_literal("[0.12, -0.04, 1e-3, 2]").unwrap();
        assert_eq!(v, vec![0.12, -0.04, 0.001, 2.0]);
    }

    #[test]
    fn test_parse_tuple_and_trailing_comma() {
        assert_eq!(parse_literal("(1.0, 0.5)").unwrap(), vec![1.0, 0.5]);
        assert_eq!(parse_literal(" [1, 2,] ").unwrap(), vec![1.0, 2.0]);
        assert_eq!(parse_literal("(3,)").unwrap(), vec![3.0]);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for input in ["not-a-list", "", "[1, two]", "[[1, 2]]", "[1, 2", "{}"] {
            assert!(
                matches!(parse_literal(input), Err(DecodeError::Malformed(_))),
                "{:?} should be malformed",
                input
            );
        }
    }

    #[test]
    fn test_parse_rejects_empty_and_non_finite() {
        assert!(matches!(parse_literal("[]"), Err(DecodeError::Malformed(_))));
        assert!(matches!(parse_literal("[1.0, nan]"), Err(DecodeError::Malformed(_))));
        assert!(matches!(parse_literal("(inf, 1)"), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn test_decode_checks_expected_dimension() {
        assert_eq!(decode("[1, 0]", Some(2)).unwrap(), vec![1.0, 0.0]);
        assert_eq!(
            decode("[1, 0, 0]", Some(2)),
            Err(DecodeError::DimensionMismatch { expected: 2, actual: 3 })
        );
        assert!(decode("[1, 0, 0]", None).is_ok());
    }

    #[test]
    fn test_decoder_establishes_dimension_from_first_success() {
        let mut decoder = VectorDecoder::new();

        assert!(decoder.decode("garbage").is_err());
        assert_eq!(decoder.dimension(), None);

        decoder.decode("[1, 2, 3]").unwrap();
        assert_eq!(decoder.dimension(), Some(3));

        assert_eq!(
            decoder.decode("[1, 2]"),
            Err(DecodeError::DimensionMismatch { expected: 3, actual: 2 })
        );
        assert!(decoder.check_override().is_ok());
    }

    #[test]
    fn test_override_disagreement_is_reported() {
        let mut decoder = VectorDecoder::with_dimension(4);

        assert!(decoder.decode("[1, 2]").is_err());
        assert!(decoder.decode("(1, 2, 3)").is_err());
        assert_eq!(
            decoder.check_override(),
            Err(DecodeError::DimensionMismatch { expected: 4, actual: 2 })
        );

        let mut agreeing = VectorDecoder::with_dimension(2);
        agreeing.decode("[0.5, 0.5]").unwrap();
        assert!(agreeing.check_override().is_ok());

        let nothing_parsed = VectorDecoder::with_dimension(2);
        assert!(nothing_parsed.check_override().is_ok());
    }

    #[test]
    fn test_override_outlier_is_excluded_in_any_position() {
        let rows = ["[1, 2]", "[1, 0, 0, 0]", "[0.9, 0.1, 0, 0]"];

        for first in 0..rows.len() {
            let mut decoder = VectorDecoder::with_dimension(4);
            let mut accepted = 0;
            for row in rows.iter().cycle().skip(first).take(rows.len()) {
                match decoder.decode(row) {
                    Ok(_) => accepted += 1,
                    Err(e) => assert_eq!(e, DecodeError::DimensionMismatch { expected: 4, actual: 2 }),
                }
            }

            assert_eq!(accepted, 2);
            assert!(
                decoder.check_override().is_ok(),
                "outlier at rotation {} should not fail the batch",
                first
            );
        }
    }
}
