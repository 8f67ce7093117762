//! Forecast result structure for holding predictions.

use crate::error::{ForecastError, Result};

/// Lower and upper bounds of a prediction interval at a confidence level.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionInterval {
    lower: Vec<f64>,
    upper: Vec<f64>,
    level: f64,
}

impl PredictionInterval {
    /// Create an interval, checking that both bounds have the same length.
    pub fn new(lower: Vec<f64>, upper: Vec<f64>, level: f64) -> Result<Self> {
        if lower.len() != upper.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: lower.len(),
                got: upper.len(),
            });
        }
        if !(level > 0.0 && level < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "confidence level must be in (0, 1), got {level}"
            )));
        }
        Ok(Self {
            lower,
            upper,
            level,
        })
    }

    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// Confidence level, e.g. 0.95.
    pub fn level(&self) -> f64 {
        self.level
    }

    /// Width `upper - lower` at each step.
    pub fn widths(&self) -> Vec<f64> {
        self.upper
            .iter()
            .zip(&self.lower)
            .map(|(u, l)| u - l)
            .collect()
    }
}

/// A univariate forecast: point predictions and an optional interval.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forecast {
    point: Vec<f64>,
    interval: Option<PredictionInterval>,
}

impl Forecast {
    /// Create an empty forecast.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a forecast from point predictions.
    pub fn from_values(values: Vec<f64>) -> Self {
        Self {
            point: values,
            interval: None,
        }
    }

    /// Create a forecast with a prediction interval.
    pub fn from_values_with_intervals(
        values: Vec<f64>,
        lower: Vec<f64>,
        upper: Vec<f64>,
        level: f64,
    ) -> Result<Self> {
        if values.len() != lower.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: values.len(),
                got: lower.len(),
            });
        }
        Ok(Self {
            point: values,
            interval: Some(PredictionInterval::new(lower, upper, level)?),
        })
    }

    /// Number of forecast steps.
    pub fn horizon(&self) -> usize {
        self.point.len()
    }

    pub fn is_empty(&self) -> bool {
        self.point.is_empty()
    }

    /// Point predictions (forecast mean).
    pub fn mean(&self) -> &[f64] {
        &self.point
    }

    pub fn interval(&self) -> Option<&PredictionInterval> {
        self.interval.as_ref()
    }

    pub fn has_interval(&self) -> bool {
        self.interval.is_some()
    }

    /// Lower bounds, or an error when the forecast carries no interval.
    pub fn lower(&self) -> Result<&[f64]> {
        self.interval
            .as_ref()
            .map(|i| i.lower())
            .ok_or_else(|| ForecastError::InvalidParameter("forecast has no interval".into()))
    }

    /// Upper bounds, or an error when the forecast carries no interval.
    pub fn upper(&self) -> Result<&[f64]> {
        self.interval
            .as_ref()
            .map(|i| i.upper())
            .ok_or_else(|| ForecastError::InvalidParameter("forecast has no interval".into()))
    }
}
