//! Model-ready numeric matrix emitted by a fit pipeline

use super::error::{PrepError, PrepResult};

/// Rows × named `f64` columns. Stored by column; rows are assembled on demand.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NumericMatrix {
    column_names: Vec<String>,
    columns: Vec<Vec<f64>>,
    n_rows: usize,
}

impl NumericMatrix {
    /// Build a matrix from named columns of equal length
    pub fn from_columns(columns: Vec<(String, Vec<f64>)>) -> PrepResult<Self> {
        let n_rows = columns.first().map(|(_, v)| v.len()).unwrap_or(0);
        if let Some((name, values)) = columns.iter().find(|(_, v)| v.len() != n_rows) {
            return Err(PrepError::invalid(
                "columns",
                format!("column '{}' has {} rows, expected {}", name, values.len(), n_rows),
            ));
        }

        let (column_names, columns) = columns.into_iter().unzip();
        Ok(Self {
            column_names,
            columns,
            n_rows,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.column_names.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.column_names
            .iter()
            .position(|n| n == name)
            .map(|i| self.columns[i].as_slice())
    }

    /// Iterate `(name, values)` in column order
    pub fn columns(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.column_names
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter().map(Vec::as_slice))
    }

    pub fn row(&self, index: usize) -> Option<Vec<f64>> {
        (index < self.n_rows).then(|| self.columns.iter().map(|c| c[index]).collect())
    }

    /// Row-major copy, the layout most classifiers consume
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.n_rows)
            .map(|i| self.columns.iter().map(|c| c[i]).collect())
            .collect()
    }
}
