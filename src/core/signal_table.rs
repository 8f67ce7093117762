//! Timestamped table of named signals with an explicit column schema.

use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Semantic type of a signal column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Floating-point samples; eligible for feature generation.
    Numeric,
    /// Labels, annotations and other text; skipped by feature generation.
    NonNumeric,
}

/// Values stored in a column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<f64>),
    Text(Vec<String>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnData::Numeric(_) => ColumnKind::Numeric,
            ColumnData::Text(_) => ColumnKind::NonNumeric,
        }
    }
}

/// Schema entry: a column name and its semantic type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
}

/// An ordered sequence of timestamped rows.
///
/// The index is monotonically non-decreasing; repeated timestamps are
/// allowed. Every column has one value per row.
#[derive(Debug, Clone)]
pub struct SignalTable {
    timestamps: Vec<DateTime<Utc>>,
    schema: Vec<ColumnSpec>,
    columns: Vec<ColumnData>,
}

/// Builder for constructing a [`SignalTable`].
#[derive(Debug, Clone, Default)]
pub struct SignalTableBuilder {
    timestamps: Vec<DateTime<Utc>>,
    columns: Vec<(String, ColumnData)>,
}

impl SignalTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timestamps(mut self, timestamps: Vec<DateTime<Utc>>) -> Self {
        self.timestamps = timestamps;
        self
    }

    /// Add a numeric signal column.
    pub fn numeric(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.columns.push((name.into(), ColumnData::Numeric(values)));
        self
    }

    /// Add a non-numeric column.
    pub fn text(mut self, name: impl Into<String>, values: Vec<String>) -> Self {
        self.columns.push((name.into(), ColumnData::Text(values)));
        self
    }

    pub fn column(mut self, name: impl Into<String>, data: ColumnData) -> Self {
        self.columns.push((name.into(), data));
        self
    }

    pub fn build(self) -> Result<SignalTable> {
        SignalTable::new(self.timestamps, self.columns)
    }
}

impl SignalTable {
    /// Create a table, validating index order, column lengths and names.
    pub fn new(timestamps: Vec<DateTime<Utc>>, columns: Vec<(String, ColumnData)>) -> Result<Self> {
        if timestamps.windows(2).any(|w| w[1] < w[0]) {
            return Err(ForecastError::TimestampError(
                "timestamps must be non-decreasing".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let mut schema = Vec::with_capacity(columns.len());
        let mut data = Vec::with_capacity(columns.len());

        for (name, column) in columns {
            if column.len() != timestamps.len() {
                return Err(ForecastError::DimensionMismatch {
                    expected: timestamps.len(),
                    got: column.len(),
                });
            }
            if !seen.insert(name.clone()) {
                return Err(ForecastError::Schema(format!("duplicate column '{name}'")));
            }
            schema.push(ColumnSpec {
                name,
                kind: column.kind(),
            });
            data.push(column);
        }

        Ok(Self {
            timestamps,
            schema,
            columns: data,
        })
    }

    pub fn builder() -> SignalTableBuilder {
        SignalTableBuilder::new()
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

    pub fn schema(&self) -> &[ColumnSpec] {
        &self.schema
    }

    pub fn num_columns(&self) -> usize {
        self.schema.len()
    }

    /// Numeric columns in schema order.
    pub fn numeric_columns(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.schema
            .iter()
            .zip(&self.columns)
            .filter_map(|(spec, data)| match data {
                ColumnData::Numeric(values) => Some((spec.name.as_str(), values.as_slice())),
                ColumnData::Text(_) => None,
            })
    }

    pub fn column(&self, name: &str) -> Option<&ColumnData> {
        self.schema
            .iter()
            .position(|spec| spec.name == name)
            .map(|i| &self.columns[i])
    }

    /// Numeric values of a column.
    pub fn numeric(&self, name: &str) -> Result<&[f64]> {
        match self.column(name) {
            Some(ColumnData::Numeric(values)) => Ok(values),
            Some(ColumnData::Text(_)) => {
                Err(ForecastError::Schema(format!("column '{name}' is not numeric")))
            }
            None => Err(ForecastError::Schema(format!("no column named '{name}'"))),
        }
    }

    /// Extract a numeric column as a time-indexed series for model fitting.
    ///
    /// Fails when the index contains repeated timestamps.
    pub fn series(&self, name: &str) -> Result<TimeSeries> {
        let values = self.numeric(name)?.to_vec();
        Ok(TimeSeries::univariate(self.timestamps.clone(), values)?.with_name(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn make_timestamps(n: usize) -> Vec<DateTime<Utc>> {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..n).map(|i| base + Duration::seconds(i as i64)).collect()
    }

    #[test]
    fn signal_table_records_schema_in_column_order() {
        let table = SignalTable::builder()
            .timestamps(make_timestamps(3))
            .numeric("hr", vec![60.0, 61.0, 62.0])
            .text("activity", vec!["rest".into(), "rest".into(), "walk".into()])
            .numeric("eda", vec![0.1, 0.2, 0.3])
            .build()
            .unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.num_columns(), 3);
        assert_eq!(table.schema()[1].kind, ColumnKind::NonNumeric);

        let numeric: Vec<&str> = table.numeric_columns().map(|(name, _)| name).collect();
        assert_eq!(numeric, vec!["hr", "eda"]);
    }

    #[test]
    fn signal_table_allows_repeated_timestamps() {
        let mut timestamps = make_timestamps(3);
        timestamps[2] = timestamps[1];

        let table = SignalTable::builder()
            .timestamps(timestamps)
            .numeric("hr", vec![1.0, 2.0, 3.0])
            .build();
        assert!(table.is_ok());
    }

    #[test]
    fn signal_table_rejects_decreasing_timestamps() {
        let mut timestamps = make_timestamps(3);
        timestamps.swap(0, 2);

        let result = SignalTable::builder()
            .timestamps(timestamps)
            .numeric("hr", vec![1.0, 2.0, 3.0])
            .build();
        assert!(matches!(result, Err(ForecastError::TimestampError(_))));
    }

    #[test]
    fn signal_table_validates_columns() {
        let result = SignalTable::builder()
            .timestamps(make_timestamps(3))
            .numeric("hr", vec![1.0, 2.0])
            .build();
        assert!(matches!(
            result,
            Err(ForecastError::DimensionMismatch { expected: 3, got: 2 })
        ));

        let result = SignalTable::builder()
            .timestamps(make_timestamps(2))
            .numeric("hr", vec![1.0, 2.0])
            .numeric("hr", vec![3.0, 4.0])
            .build();
        assert!(matches!(result, Err(ForecastError::Schema(_))));
    }

    #[test]
    fn signal_table_column_lookup() {
        let table = SignalTable::builder()
            .timestamps(make_timestamps(2))
            .numeric("hr", vec![1.0, 2.0])
            .text("note", vec!["a".into(), "b".into()])
            .build()
            .unwrap();

        assert_eq!(table.numeric("hr").unwrap(), &[1.0, 2.0]);
        assert!(matches!(table.numeric("note"), Err(ForecastError::Schema(_))));
        assert!(matches!(table.numeric("spo2"), Err(ForecastError::Schema(_))));

        let series = table.series("hr").unwrap();
        assert_eq!(series.name(), Some("hr"));
        assert_eq!(series.values(), &[1.0, 2.0]);
    }
}
