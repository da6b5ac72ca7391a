//! Typed, columnar storage for customer records
//!
//! Cells are resolved to one of two kinds when a dataset is built: numeric
//! (`f64`) or nominal (text category). Every record in a dataset shares one
//! schema, so steps can match on `ColumnData` instead of coercing values.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{PrepError, PrepResult};

/// Tolerance for floating point comparison when checking binary 0/1 values
const TOLERANCE: f64 = 1e-9;

/// Semantic kind of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Nominal,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Numeric => write!(f, "numeric"),
            ColumnKind::Nominal => write!(f, "nominal"),
        }
    }
}

/// A single cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Numeric(f64),
    Nominal(String),
}

impl Value {
    pub fn kind(&self) -> ColumnKind {
        match self {
            Value::Numeric(_) => ColumnKind::Numeric,
            Value::Nominal(_) => ColumnKind::Nominal,
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Numeric(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Nominal(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Nominal(v)
    }
}

/// One row: an ordered mapping from feature name to value
pub type Record = Vec<(String, Value)>;

/// Values of a single column
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<f64>),
    Nominal(Vec<String>),
}

impl ColumnData {
    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnData::Numeric(_) => ColumnKind::Numeric,
            ColumnData::Nominal(_) => ColumnKind::Nominal,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Nominal(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn value(&self, row: usize) -> Value {
        match self {
            ColumnData::Numeric(v) => Value::Numeric(v[row]),
            ColumnData::Nominal(v) => Value::Nominal(v[row].clone()),
        }
    }

    fn take(&self, rows: &[usize]) -> ColumnData {
        match self {
            ColumnData::Numeric(v) => ColumnData::Numeric(rows.iter().map(|&i| v[i]).collect()),
            ColumnData::Nominal(v) => {
                ColumnData::Nominal(rows.iter().map(|&i| v[i].clone()).collect())
            }
        }
    }
}

/// A named column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn numeric(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Numeric(values),
        }
    }

    pub fn nominal<S: Into<String>>(name: impl Into<String>, values: Vec<S>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Nominal(values.into_iter().map(Into::into).collect()),
        }
    }

    pub fn kind(&self) -> ColumnKind {
        self.data.kind()
    }

    /// Numeric values, or `TypeMismatch` for a nominal column
    pub fn as_numeric(&self) -> PrepResult<&[f64]> {
        match &self.data {
            ColumnData::Numeric(v) => Ok(v),
            ColumnData::Nominal(_) => Err(PrepError::TypeMismatch {
                column: self.name.clone(),
                expected: ColumnKind::Numeric,
                found: ColumnKind::Nominal,
            }),
        }
    }

    /// Category values, or `TypeMismatch` for a numeric column
    pub fn as_nominal(&self) -> PrepResult<&[String]> {
        match &self.data {
            ColumnData::Nominal(v) => Ok(v),
            ColumnData::Numeric(_) => Err(PrepError::TypeMismatch {
                column: self.name.clone(),
                expected: ColumnKind::Nominal,
                found: ColumnKind::Numeric,
            }),
        }
    }
}

/// Ordered list of column names and kinds
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Schema {
    pub fields: Vec<(String, ColumnKind)>,
}

impl Schema {
    pub fn new(fields: Vec<(String, ColumnKind)>) -> Self {
        Self { fields }
    }

    pub fn kind_of(&self, name: &str) -> Option<ColumnKind> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, kind)| *kind)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Mapping of the binary outcome column to 0/1 labels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeMapping {
    /// Outcome column name
    pub column: String,
    /// Value that maps to 1 (churn)
    pub positive: String,
}

impl OutcomeMapping {
    pub fn new(column: impl Into<String>, positive: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            positive: positive.into(),
        }
    }
}

impl Default for OutcomeMapping {
    fn default() -> Self {
        Self::new("Churn", "Yes")
    }
}

/// An ordered sequence of records sharing one schema, stored by column
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<Column>,
    n_rows: usize,
}

impl Dataset {
    /// Build a dataset from columns of equal length with unique names
    pub fn new(columns: Vec<Column>) -> PrepResult<Self> {
        let n_rows = columns.first().map(|c| c.data.len()).unwrap_or(0);

        let mut seen = BTreeSet::new();
        for column in &columns {
            if column.data.len() != n_rows {
                return Err(PrepError::invalid(
                    "columns",
                    format!(
                        "column '{}' has {} rows, expected {}",
                        column.name,
                        column.data.len(),
                        n_rows
                    ),
                ));
            }
            if !seen.insert(column.name.as_str()) {
                return Err(PrepError::invalid(
                    "columns",
                    format!("duplicate column name '{}'", column.name),
                ));
            }
        }

        Ok(Self { columns, n_rows })
    }

    /// Build a dataset from row records. The first record fixes the schema;
    /// every later record must carry the same names, in order, with the same kinds.
    pub fn from_records(records: &[Record]) -> PrepResult<Self> {
        let Some(first) = records.first() else {
            return Ok(Self::default());
        };

        let mut columns: Vec<Column> = first
            .iter()
            .map(|(name, value)| match value {
                Value::Numeric(_) => Column::numeric(name.clone(), Vec::with_capacity(records.len())),
                Value::Nominal(_) => Column {
                    name: name.clone(),
                    data: ColumnData::Nominal(Vec::with_capacity(records.len())),
                },
            })
            .collect();

        for (row, record) in records.iter().enumerate() {
            if record.len() != columns.len() {
                return Err(PrepError::SchemaMismatch {
                    row,
                    message: format!("expected {} fields, found {}", columns.len(), record.len()),
                });
            }

            for ((name, value), column) in record.iter().zip(columns.iter_mut()) {
                if name != &column.name {
                    return Err(PrepError::SchemaMismatch {
                        row,
                        message: format!("expected field '{}', found '{}'", column.name, name),
                    });
                }
                match (&mut column.data, value) {
                    (ColumnData::Numeric(values), Value::Numeric(v)) => values.push(*v),
                    (ColumnData::Nominal(values), Value::Nominal(v)) => values.push(v.clone()),
                    (data, value) => {
                        return Err(PrepError::SchemaMismatch {
                            row,
                            message: format!(
                                "field '{}' is {}, expected {}",
                                name,
                                value.kind(),
                                data.kind()
                            ),
                        })
                    }
                }
            }
        }

        Self::new(columns)
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn schema(&self) -> Schema {
        Schema::new(
            self.columns
                .iter()
                .map(|c| (c.name.clone(), c.kind()))
                .collect(),
        )
    }

    pub fn column(&self, name: &str) -> PrepResult<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| PrepError::unknown(name))
    }

    pub fn position(&self, name: &str) -> PrepResult<usize> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| PrepError::unknown(name))
    }

    pub fn numeric(&self, name: &str) -> PrepResult<&[f64]> {
        self.column(name)?.as_numeric()
    }

    pub fn nominal(&self, name: &str) -> PrepResult<&[String]> {
        self.column(name)?.as_nominal()
    }

    /// Reassemble row `index` as a record
    pub fn record(&self, index: usize) -> Option<Record> {
        if index >= self.n_rows {
            return None;
        }
        Some(
            self.columns
                .iter()
                .map(|c| (c.name.clone(), c.data.value(index)))
                .collect(),
        )
    }

    /// New dataset holding the given rows, in the given order.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of range.
    pub fn take_rows(&self, rows: &[usize]) -> Dataset {
        Dataset {
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    data: c.data.take(rows),
                })
                .collect(),
            n_rows: rows.len(),
        }
    }

    /// New dataset without the named columns; unknown names are ignored
    pub fn without_columns(&self, names: &[String]) -> Dataset {
        Dataset {
            columns: self
                .columns
                .iter()
                .filter(|c| !names.contains(&c.name))
                .cloned()
                .collect(),
            n_rows: self.n_rows,
        }
    }

    /// Replace the column at `index` with `replacement` (zero or more columns).
    pub(crate) fn splice(&mut self, index: usize, replacement: Vec<Column>) {
        self.columns.splice(index..=index, replacement);
    }

    /// Map the outcome column to 0/1 labels.
    ///
    /// Nominal outcomes map the positive value to 1 and the other value to 0.
    /// Two distinct values without the positive one is an error; a single value
    /// other than the positive one maps to all zeros, as in an all-negative partition.
    /// Numeric outcomes must already be 0/1. More than two distinct values is an error.
    pub fn labels(&self, mapping: &OutcomeMapping) -> PrepResult<Vec<u8>> {
        let column = self.column(&mapping.column)?;

        match &column.data {
            ColumnData::Nominal(values) => {
                let distinct: BTreeSet<&str> = values.iter().map(String::as_str).collect();
                if distinct.len() > 2 {
                    return Err(PrepError::invalid(
                        "outcome",
                        format!(
                            "column '{}' has {} distinct values, expected 2",
                            mapping.column,
                            distinct.len()
                        ),
                    ));
                }
                if distinct.len() == 2 && !distinct.contains(mapping.positive.as_str()) {
                    return Err(PrepError::invalid(
                        "outcome",
                        format!(
                            "positive value '{}' not found in column '{}', found {:?}",
                            mapping.positive, mapping.column, distinct
                        ),
                    ));
                }
                Ok(values
                    .iter()
                    .map(|v| u8::from(v == &mapping.positive))
                    .collect())
            }
            ColumnData::Numeric(values) => values
                .iter()
                .map(|&v| {
                    if (v - 1.0).abs() < TOLERANCE {
                        Ok(1)
                    } else if v.abs() < TOLERANCE {
                        Ok(0)
                    } else {
                        Err(PrepError::invalid(
                            "outcome",
                            format!("column '{}' contains non-binary value {}", mapping.column, v),
                        ))
                    }
                })
                .collect(),
        }
    }
}
