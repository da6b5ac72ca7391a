//! Error types for dataset preparation and evaluation.
//!
//! Every fallible operation in the pipeline, splitter, metrics engine and
//! correlation ranker returns `PrepError`. Errors are raised where they are
//! detected and handed straight back to the caller; nothing here retries or
//! substitutes a fallback value.

use thiserror::Error;

use super::dataset::ColumnKind;

/// Errors raised while splitting, fitting, applying or evaluating.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PrepError {
    /// A configuration value is out of its valid range.
    #[error("Invalid parameter '{name}': {message}")]
    InvalidParameter { name: String, message: String },

    /// A statistic is undefined for this column (zero variance, too few
    /// distinct values, or a single outcome class).
    #[error("Degenerate column '{column}': {reason}")]
    DegenerateColumn { column: String, reason: String },

    /// Logarithm requested for a value that is zero or negative.
    #[error("Column '{column}' contains non-positive value {value} at row {row}")]
    NonPositiveValue { column: String, row: usize, value: f64 },

    /// `apply` was called on a pipeline that has not been fit.
    #[error("Pipeline has not been fit - call fit() on the training data first")]
    PipelineNotFit,

    /// A metric was requested over zero-length input.
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// A step or lookup referenced a column the dataset does not contain.
    #[error("Column '{column}' not found in dataset")]
    UnknownColumn { column: String },

    /// A step addressed a column of the wrong kind.
    #[error("Column '{column}' must be {expected}, found {found}")]
    TypeMismatch {
        column: String,
        expected: ColumnKind,
        found: ColumnKind,
    },

    /// Records passed to a dataset builder do not share one schema.
    #[error("Record {row} does not match the dataset schema: {message}")]
    SchemaMismatch { row: usize, message: String },
}

impl PrepError {
    pub(crate) fn invalid(name: &str, message: impl Into<String>) -> Self {
        PrepError::InvalidParameter {
            name: name.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn degenerate(column: &str, reason: impl Into<String>) -> Self {
        PrepError::DegenerateColumn {
            column: column.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unknown(column: &str) -> Self {
        PrepError::UnknownColumn {
            column: column.to_string(),
        }
    }
}

/// Result alias used throughout the pipeline module.
pub type PrepResult<T> = std::result::Result<T, PrepError>;
