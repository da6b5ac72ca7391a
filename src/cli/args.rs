//! Command-line argument definitions using clap

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

/// churnprep - Leakage-free feature preparation and evaluation for churn models
#[derive(Parser, Debug)]
#[command(name = "churnprep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Split a customer table, fit the recipe on the training rows and write
    /// numeric train/test matrices
    Prepare(PrepareArgs),

    /// Score classifier predictions against held-out truth
    Evaluate(EvaluateArgs),
}

#[derive(Args, Debug, Clone)]
pub struct PrepareArgs {
    /// Input file path (CSV or Parquet)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Recipe file (JSON). Defaults to the built-in churn recipe:
    /// 6 tenure bins, log TotalCharges, encode nominal, center-scale numeric.
    #[arg(short, long)]
    pub recipe: Option<PathBuf>,

    /// Outcome column name. Overrides the recipe's outcome (default: Churn).
    #[arg(short, long)]
    pub outcome: Option<String>,

    /// Outcome value that maps to 1. Overrides the recipe's value (default: Yes).
    #[arg(long)]
    pub positive: Option<String>,

    /// Expected share of rows assigned to the training partition (0 < f < 1)
    #[arg(long, default_value = "0.8", value_parser = validate_train_fraction)]
    pub train_fraction: f64,

    /// Seed for the train/test split. The same seed always yields the same split.
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Columns to drop at load time (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub drop_columns: Vec<String>,

    /// Number of rows to use for schema inference (CSV only).
    /// Use 0 for full table scan.
    #[arg(long, default_value = "10000")]
    pub infer_schema_length: usize,

    /// Training matrix output path (CSV or Parquet, determined by extension).
    /// Defaults to the input directory with a '_train' suffix.
    #[arg(long)]
    pub train_output: Option<PathBuf>,

    /// Testing matrix output path. Defaults to the input directory with a '_test' suffix.
    #[arg(long)]
    pub test_output: Option<PathBuf>,

    /// Write a JSON run report (fitted parameters, columns, correlations) to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Number of strongest correlations to print
    #[arg(long, default_value = "10")]
    pub top: usize,
}

impl PrepareArgs {
    /// Training matrix path, derived from the input when not given
    pub fn train_output_path(&self) -> PathBuf {
        self.train_output
            .clone()
            .unwrap_or_else(|| derive_output_path(&self.input, "train"))
    }

    /// Testing matrix path, derived from the input when not given
    pub fn test_output_path(&self) -> PathBuf {
        self.test_output
            .clone()
            .unwrap_or_else(|| derive_output_path(&self.input, "test"))
    }
}

#[derive(Args, Debug, Clone)]
pub struct EvaluateArgs {
    /// Predictions file (CSV or Parquet) with truth, probability and optional label columns
    #[arg(short, long)]
    pub input: PathBuf,

    /// Truth column name
    #[arg(long, default_value = "Churn")]
    pub truth: String,

    /// Predicted label column. When omitted, labels are derived from the
    /// probability column with --threshold.
    #[arg(long)]
    pub predicted: Option<String>,

    /// Predicted probability of the positive class
    #[arg(long, default_value = "probability")]
    pub probability: String,

    /// Value of text label columns that maps to 1
    #[arg(long, default_value = "Yes")]
    pub positive: String,

    /// Decision threshold for deriving labels from probabilities (0 to 1)
    #[arg(long, default_value = "0.5", value_parser = validate_threshold)]
    pub threshold: f64,

    /// Write the metrics report as JSON to this path
    #[arg(long)]
    pub report: Option<PathBuf>,
}

/// `<dir>/<stem>_<suffix>.<ext>` next to the input, keeping its extension
pub fn derive_output_path(input: &Path, suffix: &str) -> PathBuf {
    let parent = input.parent().unwrap_or_else(|| Path::new("."));
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let extension = input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("csv");
    parent.join(format!("{}_{}.{}", stem, suffix, extension))
}

/// Validator for train_fraction parameter
fn validate_train_fraction(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if value > 0.0 && value < 1.0 {
        Ok(value)
    } else {
        Err(format!(
            "train_fraction must be strictly between 0.0 and 1.0, got {}",
            value
        ))
    }
}

/// Validator for threshold parameter
fn validate_threshold(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if !(0.0..=1.0).contains(&value) {
        Err(format!(
            "threshold must be between 0.0 and 1.0, got {}",
            value
        ))
    } else {
        Ok(value)
    }
}
