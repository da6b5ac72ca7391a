//! Dataset loading and matrix output for CSV and Parquet files
//!
//! Ingestion resolves every column to numeric or nominal once, here, and drops
//! rows that have a missing value in any column. Text columns whose non-blank
//! values all parse as numbers become numeric (blank cells count as missing).

use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::*;

use super::dataset::{Column as FeatureColumn, ColumnData, Dataset, OutcomeMapping};
use super::matrix::NumericMatrix;
use super::metrics::labels_from_probabilities;

/// A dataset read from disk, with row accounting for the drop of incomplete rows
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub dataset: Dataset,
    pub rows_read: usize,
    pub rows_dropped: usize,
}

/// Raw column values before incomplete rows are removed
enum RawColumn {
    Numeric(Vec<Option<f64>>),
    Nominal(Vec<Option<String>>),
}

impl RawColumn {
    fn is_missing(&self, row: usize) -> bool {
        match self {
            RawColumn::Numeric(v) => v[row].map_or(true, f64::is_nan),
            RawColumn::Nominal(v) => v[row].is_none(),
        }
    }

    fn into_data(self, keep: &[bool]) -> ColumnData {
        match self {
            RawColumn::Numeric(v) => ColumnData::Numeric(
                v.into_iter()
                    .zip(keep)
                    .filter_map(|(x, &k)| if k { x } else { None })
                    .collect(),
            ),
            RawColumn::Nominal(v) => ColumnData::Nominal(
                v.into_iter()
                    .zip(keep)
                    .filter_map(|(x, &k)| if k { x } else { None })
                    .collect(),
            ),
        }
    }
}

/// Read a CSV or Parquet file (by extension) into a polars DataFrame
pub fn load_frame(path: &Path, infer_schema_length: usize) -> Result<DataFrame> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    // 0 means full table scan
    let schema_length = if infer_schema_length == 0 {
        None
    } else {
        Some(infer_schema_length)
    };

    let lf = match extension.as_str() {
        "csv" => LazyCsvReader::new(path)
            .with_infer_schema_length(schema_length)
            .finish()
            .with_context(|| format!("Failed to load CSV file: {}", path.display()))?,
        "parquet" => LazyFrame::scan_parquet(path, Default::default())
            .with_context(|| format!("Failed to load Parquet file: {}", path.display()))?,
        _ => anyhow::bail!(
            "Unsupported file format: {}. Supported formats: csv, parquet",
            extension
        ),
    };

    lf.collect()
        .with_context(|| format!("Failed to read {}", path.display()))
}

/// Load a file as a typed dataset, removing `drop_columns` and incomplete rows
pub fn load_dataset(
    path: &Path,
    infer_schema_length: usize,
    drop_columns: &[String],
) -> Result<LoadedDataset> {
    let df = load_frame(path, infer_schema_length)?;
    let loaded = frame_to_dataset(&df, drop_columns)?;
    Ok(loaded)
}

/// Convert a DataFrame into a typed dataset, dropping rows with any missing value
pub fn frame_to_dataset(df: &DataFrame, drop_columns: &[String]) -> Result<LoadedDataset> {
    let rows_read = df.height();

    let mut raw: Vec<(String, RawColumn)> = Vec::new();
    for col in df.get_columns() {
        let name = col.name().to_string();
        if drop_columns.contains(&name) {
            continue;
        }
        let values = resolve_column(col)
            .with_context(|| format!("Failed to read column '{}'", name))?;
        raw.push((name, values));
    }

    let keep: Vec<bool> = (0..rows_read)
        .map(|row| raw.iter().all(|(_, c)| !c.is_missing(row)))
        .collect();
    let rows_kept = keep.iter().filter(|&&k| k).count();

    let columns = raw
        .into_iter()
        .map(|(name, values)| FeatureColumn {
            name,
            data: values.into_data(&keep),
        })
        .collect();

    Ok(LoadedDataset {
        dataset: Dataset::new(columns)?,
        rows_read,
        rows_dropped: rows_read - rows_kept,
    })
}

fn resolve_column(col: &Column) -> Result<RawColumn> {
    if col.dtype().is_primitive_numeric() {
        let float_col = col.cast(&DataType::Float64)?;
        return Ok(RawColumn::Numeric(float_col.f64()?.iter().collect()));
    }

    let text_col = match col.dtype() {
        DataType::String => col.clone(),
        _ => col.cast(&DataType::String)?,
    };
    let text: Vec<Option<String>> = text_col
        .str()?
        .iter()
        .map(|v| v.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string))
        .collect();

    let parsed: Option<Vec<Option<f64>>> = text
        .iter()
        .map(|v| match v {
            Some(s) => s.parse::<f64>().ok().map(Some),
            None => Some(None),
        })
        .collect();

    match parsed {
        Some(values) if values.iter().any(Option::is_some) => Ok(RawColumn::Numeric(values)),
        _ => Ok(RawColumn::Nominal(text)),
    }
}

/// Write a numeric matrix (and optionally its label column) as CSV or Parquet
pub fn write_matrix(
    matrix: &NumericMatrix,
    labels: Option<(&str, &[u8])>,
    path: &Path,
) -> Result<()> {
    let mut columns: Vec<Column> = matrix
        .columns()
        .map(|(name, values)| Column::new(name.into(), values.to_vec()))
        .collect();

    if let Some((name, labels)) = labels {
        if labels.len() != matrix.n_rows() {
            anyhow::bail!(
                "Label column has {} values, matrix has {} rows",
                labels.len(),
                matrix.n_rows()
            );
        }
        let values: Vec<i32> = labels.iter().map(|&l| i32::from(l)).collect();
        columns.push(Column::new(name.into(), values));
    }

    let mut df = DataFrame::new(columns).context("Failed to assemble output frame")?;
    save_frame(&mut df, path)
}

/// Save a DataFrame to file (CSV or Parquet based on extension)
fn save_frame(df: &mut DataFrame, path: &Path) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "csv" => {
            let mut file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            CsvWriter::new(&mut file)
                .finish(df)
                .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;
        }
        "parquet" => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            ParquetWriter::new(file)
                .finish(df)
                .with_context(|| format!("Failed to write Parquet file: {}", path.display()))?;
        }
        _ => anyhow::bail!(
            "Unsupported output format: {}. Supported formats: csv, parquet",
            extension
        ),
    }

    Ok(())
}

/// Classifier output aligned with held-out truth
#[derive(Debug, Clone, PartialEq)]
pub struct Predictions {
    pub truth: Vec<u8>,
    pub predicted: Vec<u8>,
    pub probability: Vec<f64>,
}

/// Column layout of a predictions file
#[derive(Debug, Clone)]
pub struct PredictionColumns {
    pub truth: String,
    /// Positive value of the truth/predicted columns when they are text
    pub positive: String,
    /// When absent, labels are derived from the probability and `threshold`
    pub predicted: Option<String>,
    pub probability: String,
    pub threshold: f64,
}

/// Read truth, predicted label and probability columns from a predictions file
pub fn load_predictions(path: &Path, layout: &PredictionColumns) -> Result<Predictions> {
    let loaded = load_dataset(path, 0, &[])?;
    if loaded.rows_dropped > 0 {
        anyhow::bail!(
            "Predictions file {} has {} incomplete row(s)",
            path.display(),
            loaded.rows_dropped
        );
    }
    let ds = loaded.dataset;

    let truth = ds.labels(&OutcomeMapping::new(&layout.truth, &layout.positive))?;
    let probability = ds
        .numeric(&layout.probability)
        .with_context(|| format!("Probability column '{}'", layout.probability))?
        .to_vec();
    let predicted = match &layout.predicted {
        Some(column) => ds.labels(&OutcomeMapping::new(column, &layout.positive))?,
        None => labels_from_probabilities(&probability, layout.threshold)?,
    };

    Ok(Predictions {
        truth,
        predicted,
        probability,
    })
}
