//! Univariate series with a time or integer index, used for model fitting.

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// Index of a univariate series.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesIndex {
    /// Timestamps, strictly increasing.
    Time(Vec<DateTime<Utc>>),
    /// Integer positions, strictly increasing.
    Integer(Vec<i64>),
}

impl SeriesIndex {
    pub fn len(&self) -> usize {
        match self {
            SeriesIndex::Time(ts) => ts.len(),
            SeriesIndex::Integer(ix) => ix.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_time_based(&self) -> bool {
        matches!(self, SeriesIndex::Time(_))
    }

    /// First timestamp of a time index.
    pub fn first_time(&self) -> Option<DateTime<Utc>> {
        match self {
            SeriesIndex::Time(ts) => ts.first().copied(),
            SeriesIndex::Integer(_) => None,
        }
    }

    /// Positions on a numeric axis.
    ///
    /// Time indexes map to seconds elapsed since `origin` (or since their
    /// own first timestamp); integer indexes map to themselves.
    pub fn axis_values(&self, origin: Option<DateTime<Utc>>) -> Vec<f64> {
        match self {
            SeriesIndex::Time(ts) => {
                let Some(origin) = origin.or_else(|| ts.first().copied()) else {
                    return Vec::new();
                };
                ts.iter()
                    .map(|t| (*t - origin).num_milliseconds() as f64 / 1000.0)
                    .collect()
            }
            SeriesIndex::Integer(ix) => ix.iter().map(|&i| i as f64).collect(),
        }
    }

    /// Drop the first `n` entries.
    pub fn skip(&self, n: usize) -> SeriesIndex {
        match self {
            SeriesIndex::Time(ts) => SeriesIndex::Time(ts.iter().skip(n).copied().collect()),
            SeriesIndex::Integer(ix) => SeriesIndex::Integer(ix.iter().skip(n).copied().collect()),
        }
    }

    fn validate(&self) -> Result<()> {
        let increasing = match self {
            SeriesIndex::Time(ts) => ts.windows(2).all(|w| w[1] > w[0]),
            SeriesIndex::Integer(ix) => ix.windows(2).all(|w| w[1] > w[0]),
        };
        if !increasing {
            return Err(ForecastError::TimestampError(
                "series index must be strictly increasing".to_string(),
            ));
        }
        Ok(())
    }
}

/// A univariate series with its index.
#[derive(Debug, Clone)]
pub struct TimeSeries {
    index: SeriesIndex,
    values: Vec<f64>,
    name: Option<String>,
    frequency: Option<Duration>,
}

impl TimeSeries {
    /// Create a series from an index and values of the same length.
    pub fn new(index: SeriesIndex, values: Vec<f64>) -> Result<Self> {
        if index.len() != values.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: index.len(),
                got: values.len(),
            });
        }
        index.validate()?;

        Ok(Self {
            index,
            values,
            name: None,
            frequency: None,
        })
    }

    /// Create a time-indexed series.
    pub fn univariate(timestamps: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self> {
        Self::new(SeriesIndex::Time(timestamps), values)
    }

    /// Create a series indexed by positions `0..n`.
    pub fn from_values(values: Vec<f64>) -> Self {
        let index = SeriesIndex::Integer((0..values.len() as i64).collect());
        Self {
            index,
            values,
            name: None,
            frequency: None,
        }
    }

    /// Attach a display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn index(&self) -> &SeriesIndex {
        &self.index
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Get frequency.
    pub fn frequency(&self) -> Option<Duration> {
        self.frequency
    }

    /// Set frequency.
    pub fn set_frequency(&mut self, freq: Duration) {
        self.frequency = Some(freq);
    }


    /// Check if series has missing values (NaN or Inf).
    pub fn has_missing_values(&self) -> bool {
        self.values.iter().any(|v| !v.is_finite())
    }

    /// Infer the sampling frequency of a time index from its modal spacing.
    ///
    /// `tolerance` is the minimum share of gaps that must equal the mode.
    pub fn infer_frequency(&self, tolerance: f64) -> Result<Duration> {
        let SeriesIndex::Time(timestamps) = &self.index else {
            return Err(ForecastError::FrequencyInference(
                "series is not time-indexed".to_string(),
            ));
        };
        if timestamps.len() < 2 {
            return Err(ForecastError::InsufficientData {
                needed: 2,
                got: timestamps.len(),
            });
        }

        let diffs: Vec<i64> = timestamps
            .windows(2)
            .map(|w| (w[1] - w[0]).num_milliseconds())
            .collect();

        let mut counts: HashMap<i64, usize> = HashMap::new();
        for &diff in &diffs {
            *counts.entry(diff).or_insert(0) += 1;
        }

        // Ties resolve to the smaller spacing so inference is deterministic.
        let (modal_diff, modal_count) = counts
            .iter()
            .max_by(|(da, ca), (db, cb)| ca.cmp(cb).then(db.cmp(da)))
            .map(|(&diff, &count)| (diff, count))
            .ok_or(ForecastError::FrequencyInference(
                "empty spacing data".to_string(),
            ))?;

        let modal_ratio = modal_count as f64 / diffs.len() as f64;
        if modal_ratio < tolerance {
            return Err(ForecastError::FrequencyInference(
                "no unique modal spacing found".to_string(),
            ));
        }

        Ok(Duration::milliseconds(modal_diff))
    }

    /// Index of the `steps` observations following the end of the series.
    ///
    /// Time indexes advance by the explicit frequency, or by the inferred
    /// modal spacing when none is set. Integer indexes advance by one.
    pub fn future_index(&self, steps: usize) -> Result<SeriesIndex> {
        match &self.index {
            SeriesIndex::Time(timestamps) => {
                let last = *timestamps.last().ok_or(ForecastError::EmptyData)?;
                let freq = match self.frequency {
                    Some(freq) => freq,
                    None => self.infer_frequency(0.5)?,
                };
                let times = (1..=steps)
                    .map(|h| {
                        i32::try_from(h)
                            .ok()
                            .and_then(|h| freq.checked_mul(h))
                            .and_then(|offset| last.checked_add_signed(offset))
                            .ok_or_else(|| {
                                ForecastError::TimestampError(format!(
                                    "step {h} past the last timestamp is out of range"
                                ))
                            })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(SeriesIndex::Time(times))
            }
            SeriesIndex::Integer(ix) => {
                let last = ix.last().copied().unwrap_or(-1);
                Ok(SeriesIndex::Integer(
                    (1..=steps as i64).map(|h| last + h).collect(),
                ))
            }
        }
    }
}
