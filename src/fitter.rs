//! ARIMA fitting with diagnostic and forecast plots.
//!
//! # Example
//!
//! ```no_run
//! use biosignal_features::core::TimeSeries;
//! use biosignal_features::fitter::fit_arima;
//!
//! let values: Vec<f64> = (0..50).map(|i| i as f64 + (i as f64 * 0.4).sin()).collect();
//! let series = TimeSeries::from_values(values);
//!
//! let fitted = fit_arima(&series, (1, 1, 1), "plots").unwrap();
//! assert_eq!(fitted.fitted_values().len(), 49);
//! assert_eq!(fitted.forecast_result().forecast.horizon(), 10);
//! ```

use crate::core::{Forecast, SeriesIndex, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::arima::{ARIMAOrder, ARIMA};
use crate::models::Forecaster;
use crate::plot::{plot_forecast, plot_model_fit, plot_residual_diagnostics, RenderContext, DEFAULT_SIZE};
use crate::validation::{ljung_box, LjungBoxResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const MODEL_FIT_FILE: &str = "model_fit.png";
pub const RESIDUALS_FILE: &str = "residuals_diagnostics.png";
pub const FORECAST_FILE: &str = "forecast.png";

/// Configuration for [`fit_arima_with_config`].
#[derive(Debug, Clone, PartialEq)]
pub struct FitConfig {
    /// Model order (default: ARIMA(1,1,1)).
    pub order: ARIMAOrder,
    /// Directory receiving the three plots (default: `plots`).
    pub output_dir: PathBuf,
    /// Forecast steps (default: 10).
    pub horizon: usize,
    /// Prediction interval level (default: 0.95).
    pub level: f64,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            order: ARIMAOrder::default(),
            output_dir: PathBuf::from("plots"),
            horizon: 10,
            level: 0.95,
            width: DEFAULT_SIZE.0,
            height: DEFAULT_SIZE.1,
        }
    }
}

impl FitConfig {
    pub fn new(order: impl Into<ARIMAOrder>) -> Self {
        Self {
            order: order.into(),
            ..Default::default()
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_horizon(mut self, horizon: usize) -> Self {
        self.horizon = horizon;
        self
    }

    pub fn with_level(mut self, level: f64) -> Self {
        self.level = level;
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "forecast horizon must be at least 1".to_string(),
            ));
        }
        if !(self.level > 0.0 && self.level < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "interval level must be in (0, 1), got {}",
                self.level
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(ForecastError::InvalidParameter(format!(
                "image size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// Paths of the three images written by a fit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticArtifacts {
    pub model_fit: PathBuf,
    pub residuals: PathBuf,
    pub forecast: PathBuf,
}

impl DiagnosticArtifacts {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            model_fit: dir.join(MODEL_FIT_FILE),
            residuals: dir.join(RESIDUALS_FILE),
            forecast: dir.join(FORECAST_FILE),
        }
    }

    pub fn paths(&self) -> [&Path; 3] {
        [&self.model_fit, &self.residuals, &self.forecast]
    }
}

/// A forecast together with the index positions it covers.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastResult {
    pub index: SeriesIndex,
    pub forecast: Forecast,
}

/// Result of [`fit_arima`]: the fitted model and what was derived from it.
#[derive(Debug, Clone)]
pub struct FittedModel {
    model: ARIMA,
    series: TimeSeries,
    forecast: ForecastResult,
    artifacts: DiagnosticArtifacts,
    ljung_box: LjungBoxResult,
}

impl FittedModel {
    pub fn model(&self) -> &ARIMA {
        &self.model
    }

    pub fn order(&self) -> ARIMAOrder {
        self.model.order()
    }

    /// The series the model was fitted to.
    pub fn series(&self) -> &TimeSeries {
        &self.series
    }

    /// In-sample fitted values, aligned with the last `n - d` observations.
    pub fn fitted_values(&self) -> &[f64] {
        self.model.fitted_values().unwrap_or_default()
    }

    /// One-step residuals, aligned like [`FittedModel::fitted_values`].
    pub fn residuals(&self) -> &[f64] {
        self.model.residuals().unwrap_or_default()
    }

    /// A fresh forecast of `horizon` steps with a `level` interval.
    pub fn forecast(&self, horizon: usize, level: f64) -> Result<ForecastResult> {
        let forecast = self.model.predict_with_intervals(horizon, level)?;
        let index = self.series.future_index(horizon)?;
        Ok(ForecastResult { index, forecast })
    }

    /// The forecast drawn in the forecast plot.
    pub fn forecast_result(&self) -> &ForecastResult {
        &self.forecast
    }

    pub fn artifacts(&self) -> &DiagnosticArtifacts {
        &self.artifacts
    }

    /// Ljung-Box test on the residuals.
    pub fn ljung_box(&self) -> &LjungBoxResult {
        &self.ljung_box
    }
}

/// Fit an ARIMA model of `order` and write its plots into `output_dir`.
///
/// Uses the defaults of [`FitConfig`] for horizon, interval level and
/// image size.
pub fn fit_arima(
    series: &TimeSeries,
    order: impl Into<ARIMAOrder>,
    output_dir: impl AsRef<Path>,
) -> Result<FittedModel> {
    let config = FitConfig::new(order).with_output_dir(output_dir.as_ref());
    fit_arima_with_config(series, &config)
}

/// Fit an ARIMA model and write `model_fit.png`, `residuals_diagnostics.png`
/// and `forecast.png` into `config.output_dir`.
///
/// The directory is created with its parents. Fitting and forecasting run
/// before any image is written, so a failure there leaves no plots behind.
pub fn fit_arima_with_config(series: &TimeSeries, config: &FitConfig) -> Result<FittedModel> {
    config.validate()?;
    fs::create_dir_all(&config.output_dir)?;

    let mut model = ARIMA::with_order(config.order);
    model.fit(series)?;
    if !model.converged() {
        warn!(order = %config.order, "likelihood optimization hit the iteration limit");
    }

    let forecast = model.predict_with_intervals(config.horizon, config.level)?;
    let index = series.future_index(config.horizon)?;
    let forecast = ForecastResult { index, forecast };

    let fitted = model.fitted_values().unwrap_or_default();
    let residuals = model.residuals().unwrap_or_default();
    let order = config.order;
    let lb = ljung_box(residuals, None, order.p + order.q);

    info!(
        order = %order,
        n = series.len(),
        aic = model.aic(),
        sigma2 = model.sigma2(),
        ljung_box_q = lb.statistic,
        ljung_box_p = lb.p_value,
        "fitted model"
    );
    if !lb.p_value.is_nan() && !lb.is_white_noise(0.05) {
        warn!(
            p_value = lb.p_value,
            lags = lb.lags,
            "residuals show autocorrelation"
        );
    }

    let artifacts = DiagnosticArtifacts::in_dir(&config.output_dir);
    let size = (config.width, config.height);
    let context = |path: &PathBuf| RenderContext::new(path).with_size(size.0, size.1);

    plot_model_fit(&context(&artifacts.model_fit), series, fitted)?;
    plot_residual_diagnostics(
        &context(&artifacts.residuals),
        &series.index().skip(order.d),
        residuals,
    )?;
    plot_forecast(
        &context(&artifacts.forecast),
        series,
        &forecast.index,
        &forecast.forecast,
    )?;

    info!(dir = %config.output_dir.display(), "wrote diagnostic plots");

    Ok(FittedModel {
        model,
        series: series.clone(),
        forecast,
        artifacts,
        ljung_box: lb,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn increasing(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 50.0 + 0.8 * i as f64 + 2.0 * (i as f64 * 0.5).sin())
            .collect()
    }

    #[test]
    fn fit_config_defaults() {
        let config = FitConfig::default();
        assert_eq!(config.order, ARIMAOrder::new(1, 1, 1));
        assert_eq!(config.output_dir, PathBuf::from("plots"));
        assert_eq!(config.horizon, 10);
        assert_eq!(config.level, 0.95);
    }

    #[test]
    fn fit_writes_three_plots_into_nested_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("a").join("b");
        let config = FitConfig::new((1, 1, 1))
            .with_output_dir(&dir)
            .with_size(400, 300);

        let fitted = fit_arima_with_config(&TimeSeries::from_values(increasing(50)), &config).unwrap();

        assert_eq!(fitted.fitted_values().len(), 49);
        assert_eq!(fitted.residuals().len(), 49);
        for path in fitted.artifacts().paths() {
            assert!(path.starts_with(&dir));
            assert!(fs::metadata(path).unwrap().len() > 0, "{}", path.display());
        }

        let result = fitted.forecast_result();
        assert_eq!(result.forecast.horizon(), 10);
        assert_eq!(result.index, SeriesIndex::Integer((50..60).collect()));
        let lower = result.forecast.lower().unwrap();
        let upper = result.forecast.upper().unwrap();
        assert!(lower.iter().zip(upper).all(|(l, u)| l <= u));
    }

    #[test]
    fn time_indexed_forecast_extends_by_frequency() {
        let tmp = tempfile::tempdir().unwrap();
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let timestamps: Vec<_> = (0..40).map(|i| base + Duration::seconds(4 * i)).collect();
        let series = TimeSeries::univariate(timestamps, increasing(40)).unwrap();
        let config = FitConfig::new((1, 0, 0))
            .with_output_dir(tmp.path())
            .with_horizon(3)
            .with_size(320, 240);

        let fitted = fit_arima_with_config(&series, &config).unwrap();

        let expected: Vec<_> = (40..43).map(|i| base + Duration::seconds(4 * i)).collect();
        assert_eq!(fitted.forecast_result().index, SeriesIndex::Time(expected));
        assert_eq!(fitted.fitted_values().len(), 40);

        let again = fitted.forecast(5, 0.8).unwrap();
        assert_eq!(again.forecast.horizon(), 5);
        assert_eq!(again.index.len(), 5);
    }

    #[test]
    fn fit_failure_writes_no_plots() {
        let tmp = tempfile::tempdir().unwrap();
        let series = TimeSeries::from_values(vec![1.0, 2.0, 3.0]);

        let result = fit_arima(&series, (2, 1, 1), tmp.path());
        assert!(matches!(result, Err(ForecastError::InsufficientData { .. })));
        for path in DiagnosticArtifacts::in_dir(tmp.path()).paths() {
            assert!(!path.exists());
        }
    }

    #[test]
    fn random_walk_needs_three_residuals_before_any_plot() {
        let tmp = tempfile::tempdir().unwrap();

        let short = TimeSeries::from_values(vec![1.0, 3.0, 2.0]);
        let result = fit_arima(&short, (0, 1, 0), tmp.path());
        assert!(matches!(
            result,
            Err(ForecastError::InsufficientData { needed: 4, got: 3 })
        ));
        for path in DiagnosticArtifacts::in_dir(tmp.path()).paths() {
            assert!(!path.exists());
        }

        let shortest = TimeSeries::from_values(vec![1.0, 3.0, 2.0, 4.0]);
        let config = FitConfig::new((0, 1, 0))
            .with_output_dir(tmp.path())
            .with_horizon(2)
            .with_size(320, 240);
        let fitted = fit_arima_with_config(&shortest, &config).unwrap();
        assert_eq!(fitted.residuals().len(), 3);
        for path in fitted.artifacts().paths() {
            assert!(fs::metadata(path).unwrap().len() > 0, "{}", path.display());
        }
    }

    #[test]
    fn existing_plots_are_overwritten() {
        let tmp = tempfile::tempdir().unwrap();
        let stale = tmp.path().join(FORECAST_FILE);
        fs::write(&stale, b"stale").unwrap();

        let config = FitConfig::default()
            .with_output_dir(tmp.path())
            .with_size(320, 240);
        fit_arima_with_config(&TimeSeries::from_values(increasing(30)), &config).unwrap();

        assert_ne!(fs::read(&stale).unwrap(), b"stale");
    }

    #[test]
    fn invalid_config_is_rejected() {
        let series = TimeSeries::from_values(increasing(30));
        let tmp = tempfile::tempdir().unwrap();

        let config = FitConfig::default().with_output_dir(tmp.path()).with_horizon(0);
        assert!(matches!(
            fit_arima_with_config(&series, &config),
            Err(ForecastError::InvalidParameter(_))
        ));

        let config = FitConfig::default().with_output_dir(tmp.path()).with_level(1.0);
        assert!(matches!(
            fit_arima_with_config(&series, &config),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn unwritable_output_dir_is_an_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("not_a_dir");
        fs::write(&file, b"x").unwrap();

        let result = fit_arima(&TimeSeries::from_values(increasing(30)), (1, 1, 1), file.join("plots"));
        assert!(matches!(result, Err(ForecastError::Io(_))));
    }
}
