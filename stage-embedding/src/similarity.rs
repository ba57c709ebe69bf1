//! Cosine similarity calculations

use ndarray::ArrayView1;

use crate::error::ScoreError;

/// Calculate cosine similarity between two embeddings
///
/// Returns a value between -1.0 (opposite) and 1.0 (same direction).
///
/// Formula: cos(θ) = (A · B) / (||A|| ||B||)
/// where:
/// - A · B is the dot product
/// - ||A|| and ||B|| are the magnitudes (L2 norms)
///
/// A zero-norm vector has no direction, so the ratio is undefined and
/// `ScoreError::ZeroNorm` is returned instead of a number.
///
/// Each vector is divided by its largest absolute component first, so
/// neither the squared norms nor the dot product can underflow to zero or
/// overflow to infinity for any finite input.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> Result<f64, ScoreError> {
    if a.len() != b.len() {
        return Err(ScoreError::DimensionMismatch(a.len(), b.len()));
    }

    let scale_a = max_abs(a);
    let scale_b = max_abs(b);

    if scale_a == 0.0 || scale_b == 0.0 {
        return Err(ScoreError::ZeroNorm);
    }

    let a_unit = ArrayView1::from(a).mapv(|x| x / scale_a);
    let b_unit = ArrayView1::from(b).mapv(|x| x / scale_b);

    // Both norms are now in [1, sqrt(len)]
    let norm_a = a_unit.dot(&a_unit).sqrt();
    let norm_b = b_unit.dot(&b_unit).sqrt();
    let dot_product = a_unit.dot(&b_unit);

    // Rounding can push identical directions a hair past 1.0
    Ok((dot_product / (norm_a * norm_b)).clamp(-1.0, 1.0))
}

fn max_abs(values: &[f64]) -> f64 {
    values.iter().fold(0.0_f64, |max, v| max.max(v.abs()))
}

/// Score used for ranking candidates
///
/// Degenerate comparisons (zero norm, mismatched lengths) rank as negative
/// infinity: the candidate can never be chosen, and the batch carries on.
/// Never 0.0, a degenerate vector must lose to every real candidate.
pub fn ranking_score(a: &[f64], b: &[f64]) -> f64 {
    match cosine_similarity(a, b) {
        Ok(score) if !score.is_nan() => score,
        _ => f64::NEG_INFINITY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity_identical() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![1.0, 2.0, 3.0];
        let sim = cosine_similarity(&a, &b).unwrap();
        assert!((sim - 1.0).abs() < 1e-12, "Identical vectors should have similarity ~1.0");
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        let sim = cosine_similarity(&a, &b).unwrap();
        assert!(sim.abs() < 1e-12, "Orthogonal vectors should have similarity ~0.0");
    }

    #[test]
    fn test_cosine_similarity_opposite() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![-1.0, -2.0, -3.0];
        let sim = cosine_similarity(&a, &b).unwrap();
        assert!((sim + 1.0).abs() < 1e-12, "Opposite vectors should have similarity ~-1.0");
    }

    #[test]
    fn test_cosine_similarity_ignores_magnitude() {
        let a = vec![0.3, -0.7, 0.1];
        let b = vec![3.0, -7.0, 1.0];
        let sim = cosine_similarity(&a, &b).unwrap();
        assert!((sim - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cosine_similarity_symmetric() {
        let a: Vec<f64> = (0..64).map(|i| (i as f64 / 7.0).sin()).collect();
        let b: Vec<f64> = (0..64).map(|i| (i as f64 / 3.0).cos()).collect();
        let ab = cosine_similarity(&a, &b).unwrap();
        let ba = cosine_similarity(&b, &a).unwrap();
        assert!((ab - ba).abs() < 1e-12, "Should be symmetric");
        assert!((-1.0..=1.0).contains(&ab));
    }

    #[test]
    fn test_zero_norm_is_an_error() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), Err(ScoreError::ZeroNorm));
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 0.0]), Err(ScoreError::ZeroNorm));
    }

    #[test]
    fn test_tiny_magnitudes_keep_their_direction() {
        let sim = cosine_similarity(&[1e-200, 0.0], &[1.0, 0.0]).unwrap();
        assert!((sim - 1.0).abs() < 1e-12, "Tiny vector is not zero-norm");

        let sim = cosine_similarity(&[1e-310, 1e-310], &[0.0, -5e-324]).unwrap();
        assert!((sim + std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-12);
    }

    #[test]
    fn test_huge_magnitudes_do_not_overflow() {
        let sim = cosine_similarity(&[1e160, 0.0], &[1.0, 0.0]).unwrap();
        assert!((sim - 1.0).abs() < 1e-12, "Huge vs unit should be ~1.0, got {}", sim);

        let sim = cosine_similarity(&[1e300, 1e300], &[-1e300, -1e300]).unwrap();
        assert!(!sim.is_nan());
        assert!((sim + 1.0).abs() < 1e-12, "Huge opposite vectors should be ~-1.0");

        let sim = cosine_similarity(&[f64::MAX, 0.0], &[f64::MAX, f64::MAX]).unwrap();
        assert!((sim - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-12);
    }

    #[test]
    fn test_dimension_mismatch_is_an_error() {
        assert_eq!(
            cosine_similarity(&[1.0, 0.0, 0.0], &[1.0, 0.0]),
            Err(ScoreError::DimensionMismatch(3, 2))
        );
    }

    #[test]
    fn test_ranking_score_demotes_degenerate_vectors() {
        assert_eq!(ranking_score(&[0.0, 0.0], &[1.0, 0.0]), f64::NEG_INFINITY);
        assert_eq!(ranking_score(&[1.0, 0.0], &[-1.0, 0.0]), -1.0);
        assert!(ranking_score(&[1.0, 0.0], &[-1.0, 0.0]) > ranking_score(&[0.0, 0.0], &[1.0, 0.0]));
    }
}
