//! Feature/outcome correlation ranking

use faer::Mat;
use rayon::prelude::*;
use serde::Serialize;

use super::error::{PrepError, PrepResult};
use super::matrix::NumericMatrix;

/// Pearson correlation of one feature with the outcome
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureCorrelation {
    pub feature: String,
    pub coefficient: f64,
}

/// Threshold for auto-selecting matrix vs per-column computation.
/// Matrix multiplication is more efficient when there are many columns.
const MATRIX_METHOD_COLUMN_THRESHOLD: usize = 15;

/// Rank every matrix column by its Pearson correlation with `outcome`.
///
/// The result is sorted by ascending absolute coefficient, so the strongest
/// drivers come last. Columns of equal magnitude keep their matrix order.
/// Picks the matrix method for wide inputs and the per-column method otherwise.
pub fn rank_correlations(
    matrix: &NumericMatrix,
    outcome: &[f64],
) -> PrepResult<Vec<FeatureCorrelation>> {
    if matrix.n_cols() >= MATRIX_METHOD_COLUMN_THRESHOLD {
        rank_correlations_matrix(matrix, outcome)
    } else {
        rank_correlations_pairwise(matrix, outcome)
    }
}

/// Per-column Pearson correlation, parallelised over columns with Rayon
pub fn rank_correlations_pairwise(
    matrix: &NumericMatrix,
    outcome: &[f64],
) -> PrepResult<Vec<FeatureCorrelation>> {
    validate_inputs(matrix, outcome)?;

    let columns: Vec<(&str, &[f64])> = matrix.columns().collect();
    let ranked = columns
        .par_iter()
        .map(|(name, values)| {
            pearson_correlation(values, outcome)
                .map(|coefficient| FeatureCorrelation {
                    feature: name.to_string(),
                    coefficient,
                })
                .ok_or_else(|| PrepError::degenerate(name, "zero variance"))
        })
        .collect::<PrepResult<Vec<_>>>()?;

    Ok(sort_by_magnitude(ranked))
}

/// Correlation via one matrix-vector product over standardized columns.
///
/// Algorithm:
/// 1. Standardize every column and the outcome: z = (x - mean) / std
/// 2. r = Z^T * z_y / n
pub fn rank_correlations_matrix(
    matrix: &NumericMatrix,
    outcome: &[f64],
) -> PrepResult<Vec<FeatureCorrelation>> {
    validate_inputs(matrix, outcome)?;

    let n_rows = matrix.n_rows();
    let n_cols = matrix.n_cols();

    let standardized_cols: Vec<(&str, Option<Vec<f64>>)> = matrix
        .columns()
        .collect::<Vec<_>>()
        .into_par_iter()
        .map(|(name, values)| (name, standardize(values)))
        .collect();

    let mut z = Mat::<f64>::zeros(n_rows, n_cols);
    for (col_idx, (name, col_data)) in standardized_cols.iter().enumerate() {
        let col_data = col_data
            .as_ref()
            .ok_or_else(|| PrepError::degenerate(name, "zero variance"))?;
        for (row_idx, &val) in col_data.iter().enumerate() {
            z[(row_idx, col_idx)] = val;
        }
    }

    let y_std = standardize(outcome).ok_or_else(|| PrepError::degenerate("outcome", "zero variance"))?;
    let mut y = Mat::<f64>::zeros(n_rows, 1);
    for (row_idx, &val) in y_std.iter().enumerate() {
        y[(row_idx, 0)] = val;
    }

    let products = z.transpose() * &y;

    let ranked = standardized_cols
        .iter()
        .enumerate()
        .map(|(col_idx, (name, _))| FeatureCorrelation {
            feature: name.to_string(),
            coefficient: (products[(col_idx, 0)] / n_rows as f64).clamp(-1.0, 1.0),
        })
        .collect();

    Ok(sort_by_magnitude(ranked))
}

fn validate_inputs(matrix: &NumericMatrix, outcome: &[f64]) -> PrepResult<()> {
    if matrix.n_rows() != outcome.len() {
        return Err(PrepError::invalid(
            "outcome",
            format!(
                "has {} values, matrix has {} rows",
                outcome.len(),
                matrix.n_rows()
            ),
        ));
    }
    if outcome.is_empty() {
        return Err(PrepError::EmptyInput(
            "correlation needs at least one row".to_string(),
        ));
    }
    if is_constant(outcome) {
        return Err(PrepError::degenerate("outcome", "zero variance"));
    }
    Ok(())
}

fn sort_by_magnitude(mut ranked: Vec<FeatureCorrelation>) -> Vec<FeatureCorrelation> {
    ranked.sort_by(|a, b| a.coefficient.abs().total_cmp(&b.coefficient.abs()));
    ranked
}

/// Pearson correlation using Welford's single-pass algorithm.
///
/// Returns `None` when either side has zero variance.
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len();
    if n == 0 || n != y.len() || is_constant(x) || is_constant(y) {
        return None;
    }

    let mut count = 0.0;
    let mut mean_x = 0.0;
    let mut mean_y = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    let mut cov_xy = 0.0;

    for (&xi, &yi) in x.iter().zip(y) {
        count += 1.0;
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        mean_x += dx / count;
        mean_y += dy / count;
        var_x += dx * (xi - mean_x);
        var_y += dy * (yi - mean_y);
        cov_xy += dx * (yi - mean_y);
    }

    if var_x <= 0.0 || var_y <= 0.0 {
        return None;
    }

    Some((cov_xy / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

/// Exact zero-spread test; a two-pass std of a constant column can round above zero.
fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

fn population_std(values: &[f64]) -> Option<f64> {
    if values.is_empty() || is_constant(values) {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    Some((values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n).sqrt())
}

fn standardize(values: &[f64]) -> Option<Vec<f64>> {
    let std = population_std(values)?;
    if std == 0.0 || !std.is_finite() {
        return None;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    Some(values.iter().map(|v| (v - mean) / std).collect())
}
