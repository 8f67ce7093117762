//! Output table of rolling features.

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Utc};

/// Feature columns sharing the (trimmed) index of the input table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    timestamps: Vec<DateTime<Utc>>,
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl FeatureTable {
    /// Assemble a table from named columns, each one value per timestamp.
    pub fn new(timestamps: Vec<DateTime<Utc>>, columns: Vec<(String, Vec<f64>)>) -> Result<Self> {
        let mut names = Vec::with_capacity(columns.len());
        let mut data = Vec::with_capacity(columns.len());
        for (name, values) in columns {
            if values.len() != timestamps.len() {
                return Err(ForecastError::DimensionMismatch {
                    expected: timestamps.len(),
                    got: values.len(),
                });
            }
            names.push(name);
            data.push(values);
        }
        Ok(Self {
            timestamps,
            names,
            columns: data,
        })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn num_columns(&self) -> usize {
        self.names.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.columns[i].as_slice())
    }

    /// Values of every column at one row, in column order.
    pub fn row(&self, index: usize) -> Result<Vec<f64>> {
        if index >= self.len() {
            return Err(ForecastError::IndexOutOfBounds {
                index,
                size: self.len(),
            });
        }
        Ok(self.columns.iter().map(|c| c[index]).collect())
    }

    /// Iterate `(name, values)` pairs in column order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.names
            .iter()
            .zip(&self.columns)
            .map(|(n, c)| (n.as_str(), c.as_slice()))
    }
}
