//! JSON export of prepare and evaluate runs

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::pipeline::{FeatureCorrelation, FittedStep, MetricsReport, Pipeline};

/// Metadata about a prepare run
#[derive(Debug, Serialize)]
pub struct PrepareMetadata {
    /// Timestamp of the run (ISO 8601 format)
    pub timestamp: String,
    /// churnprep version
    pub churnprep_version: String,
    /// Input file path
    pub input_file: String,
    /// Recipe file, when one was given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipe_file: Option<String>,
    /// Outcome column name
    pub outcome_column: String,
    /// Outcome value mapped to 1
    pub positive_value: String,
    pub train_fraction: f64,
    pub seed: u64,
}

/// Row accounting for load and split
#[derive(Debug, Clone, Serialize)]
pub struct SplitSummary {
    pub rows_read: usize,
    pub rows_dropped: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    /// Share of positive outcomes in each partition
    pub train_positive_rate: f64,
    pub test_positive_rate: f64,
}

impl SplitSummary {
    pub fn new(
        rows_read: usize,
        rows_dropped: usize,
        train_labels: &[u8],
        test_labels: &[u8],
    ) -> Self {
        Self {
            rows_read,
            rows_dropped,
            train_rows: train_labels.len(),
            test_rows: test_labels.len(),
            train_positive_rate: positive_rate(train_labels),
            test_positive_rate: positive_rate(test_labels),
        }
    }
}

fn positive_rate(labels: &[u8]) -> f64 {
    if labels.is_empty() {
        0.0
    } else {
        labels.iter().filter(|&&l| l == 1).count() as f64 / labels.len() as f64
    }
}

/// Complete prepare-run export
#[derive(Debug, Serialize)]
pub struct PrepareExport<'a> {
    pub metadata: PrepareMetadata,
    pub split: SplitSummary,
    /// Fitted steps with their learned parameters, in execution order
    pub steps: &'a [FittedStep],
    pub output_columns: &'a [String],
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    pub excluded_columns: &'a [String],
    /// Ascending by absolute coefficient
    pub correlations: &'a [FeatureCorrelation],
}

impl<'a> PrepareExport<'a> {
    pub fn new(
        metadata: PrepareMetadata,
        split: SplitSummary,
        pipeline: &'a Pipeline,
        correlations: &'a [FeatureCorrelation],
    ) -> Result<Self> {
        Ok(Self {
            metadata,
            split,
            steps: pipeline.fitted_steps()?,
            output_columns: pipeline.output_columns()?,
            excluded_columns: pipeline.excluded_columns()?,
            correlations,
        })
    }
}

/// Metadata about an evaluate run
#[derive(Debug, Serialize)]
pub struct EvaluationMetadata {
    pub timestamp: String,
    pub churnprep_version: String,
    pub predictions_file: String,
    /// Threshold used when predicted labels were derived from probabilities
    #[serde(skip_serializing_if = "Option::is_none")]
    pub derived_threshold: Option<f64>,
}

impl EvaluationMetadata {
    pub fn new(predictions_file: &Path, derived_threshold: Option<f64>) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            churnprep_version: env!("CARGO_PKG_VERSION").to_string(),
            predictions_file: predictions_file.display().to_string(),
            derived_threshold,
        }
    }
}

/// Complete evaluate-run export
#[derive(Debug, Serialize)]
pub struct EvaluationExport {
    pub metadata: EvaluationMetadata,
    pub metrics: MetricsReport,
    /// (false-positive rate, true-positive rate) points
    pub roc_curve: Vec<(f64, f64)>,
}

impl PrepareMetadata {
    pub fn new(
        input_file: &Path,
        recipe_file: Option<&Path>,
        outcome_column: &str,
        positive_value: &str,
        train_fraction: f64,
        seed: u64,
    ) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            churnprep_version: env!("CARGO_PKG_VERSION").to_string(),
            input_file: input_file.display().to_string(),
            recipe_file: recipe_file.map(|p| p.display().to_string()),
            outcome_column: outcome_column.to_string(),
            positive_value: positive_value.to_string(),
            train_fraction,
            seed,
        }
    }
}

/// Serialize `value` as pretty JSON into `output_path`
pub fn export_json<T: Serialize>(value: &T, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize report to JSON")?;

    std::fs::write(output_path, json)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    Ok(())
}
