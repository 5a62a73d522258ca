//! TOPSIS scoring. Every criterion is treated as a benefit criterion, so callers must invert
//! "lower is better" scores before they reach the matrix.

use tracing::trace;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Topsis {
    /// Vector-normalized scores multiplied by the criterion weights, one row per candidate.
    pub weighted: Vec<Vec<f64>>,
    pub ideal_best: Vec<f64>,
    pub ideal_worst: Vec<f64>,
    pub distance_positive: Vec<f64>,
    pub distance_negative: Vec<f64>,
    /// Closeness coefficient per candidate. Zero when a candidate is as far from the worst as
    /// from the best because both distances vanish.
    pub closeness: Vec<f64>,
}

/// Score the candidate×criterion `matrix` (rows = candidates) with the index-aligned `weights`.
/// Entries missing from a short row read as 0.
pub fn score(matrix: &[Vec<f64>], weights: &[f64]) -> Topsis {
    if matrix.is_empty() {
        return Topsis::default();
    }
    let columns = weights.len();
    let entry = |row: &[f64], j: usize| row.get(j).copied().unwrap_or(0.0);

    let norms: Vec<f64> = (0..columns)
        .map(|j| {
            let norm = matrix.iter().map(|row| entry(row, j).powi(2)).sum::<f64>().sqrt();
            if norm == 0.0 {
                1.0
            } else {
                norm
            }
        })
        .collect();

    let weighted: Vec<Vec<f64>> = matrix
        .iter()
        .map(|row| {
            (0..columns)
                .map(|j| (entry(row, j) / norms[j]) * weights[j])
                .collect()
        })
        .collect();

    let column_extreme = |j: usize, pick: fn(f64, f64) -> f64| {
        weighted
            .iter()
            .map(|row| row[j])
            .reduce(pick)
            .unwrap_or(0.0)
    };
    let ideal_best: Vec<f64> = (0..columns).map(|j| column_extreme(j, f64::max)).collect();
    let ideal_worst: Vec<f64> = (0..columns).map(|j| column_extreme(j, f64::min)).collect();
    trace!(?ideal_best, ?ideal_worst, "topsis ideal vectors");

    let distance_positive: Vec<f64> = weighted.iter().map(|row| distance(row, &ideal_best)).collect();
    let distance_negative: Vec<f64> = weighted.iter().map(|row| distance(row, &ideal_worst)).collect();

    let closeness = distance_positive
        .iter()
        .zip(&distance_negative)
        .map(|(dp, dn)| {
            let denominator = dp + dn;
            if denominator == 0.0 {
                0.0
            } else {
                dn / denominator
            }
        })
        .collect();

    Topsis {
        weighted,
        ideal_best,
        ideal_worst,
        distance_positive,
        distance_negative,
        closeness,
    }
}

fn distance(row: &[f64], ideal: &[f64]) -> f64 {
    row.iter()
        .zip(ideal)
        .map(|(x, i)| (x - i).powi(2))
        .sum::<f64>()
        .sqrt()
}
