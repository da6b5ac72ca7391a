//! Transformation steps and their fitted parameters
//!
//! A step learns a parameter record from one column of the training data
//! (`fit`) and later replays it on the same column of any dataset (`apply`).
//! `apply` only reads per-row values; every aggregate it needs comes from the
//! parameters.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::dataset::{Column, ColumnData, Dataset};
use super::error::{PrepError, PrepResult};

/// A single named transformation over one column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum TransformStep {
    /// Equal-frequency binning into `bin_count` ordered bins (output is nominal)
    Discretize { column: String, bin_count: usize },
    /// Natural logarithm of a strictly positive numeric column
    LogTransform { column: String },
    /// One indicator column per category, minus the lexically-first reference
    CategoricalEncode { column: String },
    /// Subtract the training mean, divide by the training standard deviation
    CenterScale { column: String },
}

/// Parameters learned by a step from the training partition
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepParameters {
    Discretize {
        /// Ascending interior cut points (`bin_count - 1` of them)
        thresholds: Vec<f64>,
        /// Bin labels, one per bin
        labels: Vec<String>,
    },
    LogTransform,
    CategoricalEncode {
        /// Category dropped to avoid a redundant indicator
        reference: String,
        /// Retained categories, one output column each
        categories: Vec<String>,
    },
    CenterScale { mean: f64, std_dev: f64 },
}

impl TransformStep {
    pub fn discretize(column: impl Into<String>, bin_count: usize) -> Self {
        TransformStep::Discretize {
            column: column.into(),
            bin_count,
        }
    }

    pub fn log(column: impl Into<String>) -> Self {
        TransformStep::LogTransform {
            column: column.into(),
        }
    }

    pub fn encode(column: impl Into<String>) -> Self {
        TransformStep::CategoricalEncode {
            column: column.into(),
        }
    }

    pub fn center_scale(column: impl Into<String>) -> Self {
        TransformStep::CenterScale {
            column: column.into(),
        }
    }

    /// The column this step reads (and replaces)
    pub fn column(&self) -> &str {
        match self {
            TransformStep::Discretize { column, .. }
            | TransformStep::LogTransform { column }
            | TransformStep::CategoricalEncode { column }
            | TransformStep::CenterScale { column } => column,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TransformStep::Discretize { .. } => "discretize",
            TransformStep::LogTransform { .. } => "log",
            TransformStep::CategoricalEncode { .. } => "encode",
            TransformStep::CenterScale { .. } => "center_scale",
        }
    }

    /// Learn this step's parameters from `data`
    pub fn fit(&self, data: &Dataset) -> PrepResult<StepParameters> {
        let column = data.column(self.column())?;

        match self {
            TransformStep::Discretize { bin_count, .. } => {
                fit_discretize(&column.name, column.as_numeric()?, *bin_count)
            }
            TransformStep::LogTransform { .. } => {
                check_positive(&column.name, column.as_numeric()?)?;
                Ok(StepParameters::LogTransform)
            }
            TransformStep::CategoricalEncode { .. } => {
                fit_encode(&column.name, column.as_nominal()?)
            }
            TransformStep::CenterScale { .. } => {
                fit_center_scale(&column.name, column.as_numeric()?)
            }
        }
    }

    /// Replay fitted `params` on `column`, producing its replacement column(s)
    pub fn apply(&self, params: &StepParameters, column: &Column) -> PrepResult<Vec<Column>> {
        match (self, params) {
            (TransformStep::Discretize { .. }, StepParameters::Discretize { thresholds, labels }) => {
                let values = column.as_numeric()?;
                let binned = values
                    .iter()
                    .map(|&v| labels[bin_index(v, thresholds)].clone())
                    .collect();
                Ok(vec![Column {
                    name: column.name.clone(),
                    data: ColumnData::Nominal(binned),
                }])
            }
            (TransformStep::LogTransform { .. }, StepParameters::LogTransform) => {
                let values = column.as_numeric()?;
                check_positive(&column.name, values)?;
                Ok(vec![Column::numeric(
                    column.name.clone(),
                    values.iter().map(|v| v.ln()).collect(),
                )])
            }
            (
                TransformStep::CategoricalEncode { .. },
                StepParameters::CategoricalEncode { categories, .. },
            ) => {
                let values = column.as_nominal()?;
                Ok(categories
                    .iter()
                    .map(|category| {
                        Column::numeric(
                            indicator_name(&column.name, category),
                            values
                                .iter()
                                .map(|v| if v == category { 1.0 } else { 0.0 })
                                .collect(),
                        )
                    })
                    .collect())
            }
            (TransformStep::CenterScale { .. }, StepParameters::CenterScale { mean, std_dev }) => {
                let values = column.as_numeric()?;
                Ok(vec![Column::numeric(
                    column.name.clone(),
                    values.iter().map(|v| (v - mean) / std_dev).collect(),
                )])
            }
            _ => Err(PrepError::invalid(
                "parameters",
                format!("parameters do not belong to step {}", self),
            )),
        }
    }
}

impl fmt::Display for TransformStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformStep::Discretize { column, bin_count } => {
                write!(f, "discretize({}, {})", column, bin_count)
            }
            _ => write!(f, "{}({})", self.name(), self.column()),
        }
    }
}

/// Name of the indicator column for `category` of `column`
pub fn indicator_name(column: &str, category: &str) -> String {
    format!("{}_{}", column, category)
}

/// Index of the first threshold `value` does not exceed; past the last
/// threshold is the last bin. A value equal to a cut point stays in the lower bin.
fn bin_index(value: f64, thresholds: &[f64]) -> usize {
    thresholds
        .iter()
        .position(|&t| value <= t)
        .unwrap_or(thresholds.len())
}

fn fit_discretize(name: &str, values: &[f64], bin_count: usize) -> PrepResult<StepParameters> {
    if bin_count < 2 {
        return Err(PrepError::invalid(
            "bin_count",
            format!("discretize({}) needs at least 2 bins, got {}", name, bin_count),
        ));
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mut distinct = sorted.clone();
    distinct.dedup();
    if distinct.len() < bin_count {
        return Err(PrepError::degenerate(
            name,
            format!(
                "{} distinct value(s), cannot form {} bins",
                distinct.len(),
                bin_count
            ),
        ));
    }

    let thresholds = (1..bin_count)
        .map(|i| quantile(&sorted, i as f64 / bin_count as f64))
        .collect();

    let width = bin_count.to_string().len();
    let labels = (1..=bin_count)
        .map(|i| format!("bin{:0width$}", i, width = width))
        .collect();

    Ok(StepParameters::Discretize { thresholds, labels })
}

/// Linear-interpolation quantile of an ascending, non-empty slice
fn quantile(sorted: &[f64], p: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

fn check_positive(name: &str, values: &[f64]) -> PrepResult<()> {
    match values.iter().position(|v| !(*v > 0.0)) {
        Some(row) => Err(PrepError::NonPositiveValue {
            column: name.to_string(),
            row,
            value: values[row],
        }),
        None => Ok(()),
    }
}

fn fit_encode(name: &str, values: &[String]) -> PrepResult<StepParameters> {
    let mut distinct: Vec<String> = values
        .iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .cloned()
        .collect();

    if distinct.is_empty() {
        return Err(PrepError::degenerate(name, "no categories observed"));
    }

    let reference = distinct.remove(0);
    Ok(StepParameters::CategoricalEncode {
        reference,
        categories: distinct,
    })
}

fn fit_center_scale(name: &str, values: &[f64]) -> PrepResult<StepParameters> {
    let n = values.len();
    if n < 2 {
        return Err(PrepError::degenerate(
            name,
            format!("standard deviation needs at least 2 rows, got {}", n),
        ));
    }

    let mean = values.iter().sum::<f64>() / n as f64;
    let sum_sq: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    let std_dev = (sum_sq / (n - 1) as f64).sqrt();

    if std_dev == 0.0 || !std_dev.is_finite() {
        return Err(PrepError::degenerate(
            name,
            format!("standard deviation is {}", std_dev),
        ));
    }

    Ok(StepParameters::CenterScale { mean, std_dev })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric_dataset(name: &str, values: Vec<f64>) -> Dataset {
        Dataset::new(vec![Column::numeric(name, values)]).unwrap()
    }

    fn fit_apply(step: &TransformStep, ds: &Dataset) -> Vec<Column> {
        let params = step.fit(ds).unwrap();
        step.apply(&params, ds.column(step.column()).unwrap()).unwrap()
    }

    #[test]
    fn test_quantile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&sorted, 0.0), 1.0);
        assert_eq!(quantile(&sorted, 1.0), 4.0);
        assert!((quantile(&sorted, 0.5) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_discretize_thresholds_are_quantiles() {
        let ds = numeric_dataset("tenure", (1..=9).map(f64::from).collect());
        let step = TransformStep::discretize("tenure", 4);

        match step.fit(&ds).unwrap() {
            StepParameters::Discretize { thresholds, labels } => {
                assert_eq!(thresholds, vec![3.0, 5.0, 7.0]);
                assert_eq!(labels, vec!["bin1", "bin2", "bin3", "bin4"]);
            }
            other => panic!("unexpected parameters {:?}", other),
        }
    }

    #[test]
    fn test_discretize_ties_resolve_to_lower_bin() {
        let ds = numeric_dataset("tenure", (1..=9).map(f64::from).collect());
        let step = TransformStep::discretize("tenure", 4);
        let params = step.fit(&ds).unwrap();

        let probe = Column::numeric("tenure", vec![3.0, 3.0001, -100.0, 100.0, 7.0]);
        let out = step.apply(&params, &probe).unwrap();
        assert_eq!(
            out[0].as_nominal().unwrap(),
            &["bin1", "bin2", "bin1", "bin4", "bin3"]
        );
    }

    #[test]
    fn test_discretize_labels_sort_in_bin_order() {
        let ds = numeric_dataset("x", (0..40).map(f64::from).collect());
        match TransformStep::discretize("x", 12).fit(&ds).unwrap() {
            StepParameters::Discretize { labels, .. } => {
                let mut sorted = labels.clone();
                sorted.sort();
                assert_eq!(sorted, labels);
                assert_eq!(labels[0], "bin01");
                assert_eq!(labels[11], "bin12");
            }
            other => panic!("unexpected parameters {:?}", other),
        }
    }

    #[test]
    fn test_discretize_degenerate_column() {
        let ds = numeric_dataset("x", vec![1.0, 1.0, 2.0, 2.0, 2.0]);
        let err = TransformStep::discretize("x", 3).fit(&ds).unwrap_err();
        assert!(matches!(err, PrepError::DegenerateColumn { .. }));
    }

    #[test]
    fn test_discretize_rejects_single_bin() {
        let ds = numeric_dataset("x", vec![1.0, 2.0, 3.0]);
        let err = TransformStep::discretize("x", 1).fit(&ds).unwrap_err();
        assert!(matches!(err, PrepError::InvalidParameter { .. }));
    }

    #[test]
    fn test_log_roundtrips_through_exp() {
        let values = vec![0.5, 1.0, 29.85, 1889.5, 8684.8];
        let ds = numeric_dataset("TotalCharges", values.clone());
        let out = fit_apply(&TransformStep::log("TotalCharges"), &ds);

        let logged = out[0].as_numeric().unwrap();
        for (orig, l) in values.iter().zip(logged) {
            assert!((l.exp() - orig).abs() < 1e-9 * orig.max(1.0));
        }
    }

    #[test]
    fn test_log_rejects_non_positive_at_fit_and_apply() {
        let step = TransformStep::log("x");

        let err = step.fit(&numeric_dataset("x", vec![1.0, 0.0])).unwrap_err();
        assert!(matches!(err, PrepError::NonPositiveValue { row: 1, .. }));

        let params = step.fit(&numeric_dataset("x", vec![1.0, 2.0])).unwrap();
        let err = step
            .apply(&params, &Column::numeric("x", vec![3.0, -1.0]))
            .unwrap_err();
        assert!(matches!(err, PrepError::NonPositiveValue { row: 1, .. }));
    }

    #[test]
    fn test_encode_drops_reference_category() {
        let ds = Dataset::new(vec![Column::nominal(
            "Contract",
            vec!["Two year", "Month-to-month", "One year", "Month-to-month"],
        )])
        .unwrap();
        let step = TransformStep::encode("Contract");
        let params = step.fit(&ds).unwrap();

        match &params {
            StepParameters::CategoricalEncode { reference, categories } => {
                assert_eq!(reference, "Month-to-month");
                assert_eq!(categories, &["One year", "Two year"]);
            }
            other => panic!("unexpected parameters {:?}", other),
        }

        let out = step.apply(&params, ds.column("Contract").unwrap()).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].name, "Contract_One year");
        assert_eq!(out[0].as_numeric().unwrap(), &[0.0, 0.0, 1.0, 0.0]);
        assert_eq!(out[1].as_numeric().unwrap(), &[1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_encode_unseen_category_is_all_zero() {
        let ds = Dataset::new(vec![Column::nominal("g", vec!["a", "b", "c"])]).unwrap();
        let step = TransformStep::encode("g");
        let params = step.fit(&ds).unwrap();

        let out = step
            .apply(&params, &Column::nominal("g", vec!["zzz", "a"]))
            .unwrap();
        assert!(out.iter().all(|c| c.as_numeric().unwrap() == [0.0, 0.0]));
    }

    #[test]
    fn test_encode_rejects_numeric_column() {
        let err = TransformStep::encode("x")
            .fit(&numeric_dataset("x", vec![1.0]))
            .unwrap_err();
        assert!(matches!(err, PrepError::TypeMismatch { .. }));
    }

    #[test]
    fn test_center_scale_standardizes_training_column() {
        let values = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let ds = numeric_dataset("MonthlyCharges", values);
        let out = fit_apply(&TransformStep::center_scale("MonthlyCharges"), &ds);
        let scaled = out[0].as_numeric().unwrap();

        let n = scaled.len() as f64;
        let mean = scaled.iter().sum::<f64>() / n;
        let sd = (scaled.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt();
        assert!(mean.abs() < 1e-12);
        assert!((sd - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_center_scale_reuses_training_parameters() {
        let ds = numeric_dataset("x", vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        let step = TransformStep::center_scale("x");
        let params = step.fit(&ds).unwrap();
        let StepParameters::CenterScale { mean, std_dev } = params.clone() else {
            panic!("unexpected parameters {:?}", params);
        };

        let constant = Column::numeric("x", vec![std_dev; 3]);
        let out = step.apply(&params, &constant).unwrap();
        let expected = (std_dev - mean) / std_dev;
        assert!(out[0].as_numeric().unwrap().iter().all(|v| (v - expected).abs() < 1e-12));
    }

    #[test]
    fn test_center_scale_zero_variance() {
        let err = TransformStep::center_scale("x")
            .fit(&numeric_dataset("x", vec![3.0; 5]))
            .unwrap_err();
        assert!(matches!(err, PrepError::DegenerateColumn { .. }));
    }

    #[test]
    fn test_mismatched_parameters_are_rejected() {
        let err = TransformStep::log("x")
            .apply(
                &StepParameters::CenterScale { mean: 0.0, std_dev: 1.0 },
                &Column::numeric("x", vec![1.0]),
            )
            .unwrap_err();
        assert!(matches!(err, PrepError::InvalidParameter { .. }));
    }

    #[test]
    fn test_step_serde_shape() {
        let step: TransformStep =
            serde_json::from_str(r#"{"step": "discretize", "column": "tenure", "bin_count": 6}"#)
                .unwrap();
        assert_eq!(step, TransformStep::discretize("tenure", 6));
        assert_eq!(step.to_string(), "discretize(tenure, 6)");
    }
}
