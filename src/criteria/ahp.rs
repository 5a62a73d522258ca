//! Analytic Hierarchy Process weight derivation.
//!
//! The pairwise comparison matrix is built from the ratios of the contextual weights, and its
//! principal eigenvector is approximated in closed form by normalized row geometric means.

use tracing::trace;

use super::Criteria;
use crate::weights::WeightMap;

/// Stand-in for non-positive weights so that every ratio is defined.
pub const MIN_WEIGHT: f64 = 0.0001;

/// Saaty's random consistency index, indexed by matrix order.
const RANDOM_INDEX: [f64; 11] = [0.0, 0.0, 0.0, 0.58, 0.90, 1.12, 1.24, 1.32, 1.41, 1.45, 1.49];

/// `matrix[i][j] = weight_i / weight_j` in criteria order.
pub fn pairwise_matrix(weights: &WeightMap, criteria: &Criteria) -> Vec<Vec<f64>> {
    let values: Vec<f64> = criteria
        .align(weights)
        .into_iter()
        .map(|w| if w > 0.0 { w } else { MIN_WEIGHT })
        .collect();
    values
        .iter()
        .map(|wi| values.iter().map(|wj| wi / wj).collect())
        .collect()
}

/// Weight vector aligned to `criteria`, summing to 1.
pub fn derive_weights(weights: &WeightMap, criteria: &Criteria) -> Vec<f64> {
    priority_vector(&pairwise_matrix(weights, criteria))
}

/// Geometric mean of each row, divided by the sum of all row means.
pub fn priority_vector(matrix: &[Vec<f64>]) -> Vec<f64> {
    if matrix.is_empty() {
        return Vec::new();
    }
    let n = matrix.len() as f64;
    let means: Vec<f64> = matrix
        .iter()
        .map(|row| row.iter().product::<f64>().powf(n.recip()))
        .collect();
    let total: f64 = means.iter().sum();
    trace!(?means, total, "ahp row geometric means");
    means.iter().map(|m| m / total).collect()
}

/// Consistency ratio of `matrix` for its priority `vector`. Matrices of order 2 or less are
/// always consistent.
pub fn consistency_ratio(matrix: &[Vec<f64>], vector: &[f64]) -> f64 {
    let n = matrix.len();
    if n <= 2 || vector.len() != n {
        return 0.0;
    }
    let lambda_max = matrix
        .iter()
        .zip(vector)
        .map(|(row, w)| row.iter().zip(vector).map(|(a, v)| a * v).sum::<f64>() / w)
        .sum::<f64>()
        / n as f64;
    let consistency_index = (lambda_max - n as f64) / (n as f64 - 1.0);
    let random_index = RANDOM_INDEX[n.min(RANDOM_INDEX.len() - 1)];
    (consistency_index / random_index).max(0.0)
}
