//! Brute-force cosine ranking over the embedding matrix.

use crate::matrix::EmbeddingMatrix;

/// Cosine similarity, or `0.0` when the lengths differ or either vector is
/// zero.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    // f64 accumulators: squared f32 components underflow or overflow in f32.
    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;

    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        return 0.0;
    }
    (dot / denom).clamp(-1.0, 1.0) as f32
}

/// Top `k` rows of `matrix` by similarity to `query`, as `(row, score)`.
///
/// Equal scores keep row order.
#[must_use]
pub fn rank(query: &[f32], matrix: &EmbeddingMatrix, k: usize) -> Vec<(usize, f32)> {
    let mut scored: Vec<(usize, f32)> = matrix
        .iter_rows()
        .map(|row| cosine_similarity(query, row))
        .enumerate()
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(k);
    scored
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn matrix(rows: &[&[f32]]) -> EmbeddingMatrix {
        EmbeddingMatrix::from_rows(rows.iter().map(|r| r.to_vec())).unwrap()
    }

    #[test]
    fn identical_vectors() {
        let v = [0.3, -1.2, 4.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn opposite_vectors() {
        assert!((cosine_similarity(&[1.0, 2.0], &[-1.0, -2.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors() {
        assert!(cosine_similarity(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]).abs() < f32::EPSILON);
    }

    #[test]
    fn zero_vector_scores_zero() {
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]).abs() < f32::EPSILON);
    }

    #[test]
    fn length_mismatch_scores_zero() {
        assert!(cosine_similarity(&[1.0], &[1.0, 0.0]).abs() < f32::EPSILON);
    }

    #[test]
    fn ranks_best_first() {
        let m = matrix(&[&[0.0, 1.0], &[1.0, 0.0], &[0.7, 0.7]]);
        let ranked = rank(&[1.0, 0.0], &m, 3);
        let order: Vec<usize> = ranked.iter().map(|(i, _)| *i).collect();
        assert_eq!(order, vec![1, 2, 0]);
        assert!((ranked[0].1 - 1.0).abs() < 1e-6);
    }

    #[test]
    fn ties_keep_row_order() {
        let m = matrix(&[&[1.0, 0.0], &[0.0, 1.0], &[0.0, 2.0], &[0.0, -1.0]]);
        let ranked = rank(&[1.0, 0.0], &m, 4);
        let order: Vec<usize> = ranked.iter().map(|(i, _)| *i).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn k_larger_than_rows() {
        let m = matrix(&[&[1.0], &[2.0]]);
        assert_eq!(rank(&[1.0], &m, 8).len(), 2);
    }

    #[test]
    fn empty_matrix() {
        assert!(rank(&[1.0, 2.0], &EmbeddingMatrix::new(), 5).is_empty());
    }

    #[test]
    fn tiny_components_self_similarity_is_one() {
        let v = [1e-25, 2e-25, 3e-25];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn huge_components_self_similarity_is_one() {
        let v = [1e20, 2e20, 3e20];
        let score = cosine_similarity(&v, &v);
        assert!(score.is_finite());
        assert!((score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn huge_components_opposite_is_minus_one() {
        assert!((cosine_similarity(&[3e30, -1e30], &[-3e30, 1e30]) + 1.0).abs() < 1e-6);
    }

    fn component() -> impl Strategy<Value = f32> {
        prop_oneof![-10.0f32..10.0, -1e-20f32..1e-20, -1e30f32..1e30]
    }

    proptest! {
        #[test]
        fn scores_bounded_and_sorted(
            rows in prop::collection::vec(prop::collection::vec(-10.0f32..10.0, 4), 0..40),
            query in prop::collection::vec(-10.0f32..10.0, 4),
            k in 0usize..50,
        ) {
            let m = EmbeddingMatrix::from_rows(rows.clone()).unwrap();
            let ranked = rank(&query, &m, k);

            prop_assert_eq!(ranked.len(), k.min(rows.len()));
            for (_, score) in &ranked {
                prop_assert!((-1.0..=1.0).contains(score));
            }
            for pair in ranked.windows(2) {
                prop_assert!(pair[0].1 >= pair[1].1);
                if pair[0].1 == pair[1].1 {
                    prop_assert!(pair[0].0 < pair[1].0);
                }
            }
        }

        #[test]
        fn symmetric_and_bounded_across_magnitudes(
            a in prop::collection::vec(component(), 1..16),
            b in prop::collection::vec(component(), 1..16),
        ) {
            let n = a.len().min(b.len());
            let (a, b) = (&a[..n], &b[..n]);
            let ab = cosine_similarity(a, b);
            prop_assert_eq!(ab.to_bits(), cosine_similarity(b, a).to_bits());
            prop_assert!((-1.0..=1.0).contains(&ab));
            if a.iter().any(|x| *x != 0.0) {
                prop_assert!((cosine_similarity(a, a) - 1.0).abs() < 1e-5);
            }
        }
    }
}
