//! Forecaster trait defining the common interface for models.

use crate::core::{Forecast, TimeSeries};
use crate::error::Result;

/// Common interface for forecasting models.
///
/// This trait is object-safe and can be used with `Box<dyn Forecaster>`.
pub trait Forecaster {
    /// Fit the model to the time series data.
    fn fit(&mut self, series: &TimeSeries) -> Result<()>;

    /// Generate point predictions for the specified horizon.
    fn predict(&self, horizon: usize) -> Result<Forecast>;

    /// Generate predictions with a central interval at `level` (e.g. 0.95).
    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        let _ = level;
        self.predict(horizon)
    }

    /// In-sample one-step predictions on the scale of the input series.
    fn fitted_values(&self) -> Option<&[f64]>;

    /// One-step errors aligned with [`Forecaster::fitted_values`].
    fn residuals(&self) -> Option<&[f64]>;

    fn name(&self) -> &str;

    fn is_fitted(&self) -> bool {
        self.fitted_values().is_some()
    }
}

/// Type alias for boxed forecaster trait objects.
///
/// # Example
///
/// ```
/// use biosignal_features::models::arima::ARIMA;
/// use biosignal_features::models::{BoxedForecaster, Forecaster};
///
/// let model: BoxedForecaster = Box::new(ARIMA::new(1, 1, 1));
/// assert_eq!(model.name(), "ARIMA");
/// assert!(!model.is_fitted());
/// ```
pub type BoxedForecaster = Box<dyn Forecaster>;
