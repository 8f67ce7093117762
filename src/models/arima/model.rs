//! ARIMA (Autoregressive Integrated Moving Average) model.

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::arima::diff::{difference, differencing_polynomial, integrate};
use crate::models::Forecaster;
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::quantile_normal;
use std::fmt;
use tracing::debug;

/// ARIMA model order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ARIMAOrder {
    /// AR order (p)
    pub p: usize,
    /// Differencing order (d)
    pub d: usize,
    /// MA order (q)
    pub q: usize,
}

impl ARIMAOrder {
    /// Create a new ARIMA order.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    /// Whether a constant is estimated. Differenced models have none, so
    /// their forecasts carry no drift.
    pub fn has_intercept(&self) -> bool {
        self.d == 0
    }

    /// Total number of estimated parameters.
    pub fn num_params(&self) -> usize {
        self.p + self.q + usize::from(self.has_intercept())
    }

    /// Shortest series this order can be fitted to.
    ///
    /// Leaves at least three residuals, the fewest the residual
    /// diagnostics can be drawn from.
    pub fn min_length(&self) -> usize {
        self.d + self.p.max(self.q).max(1) + 2
    }
}

impl Default for ARIMAOrder {
    fn default() -> Self {
        Self::new(1, 1, 1)
    }
}

impl From<(usize, usize, usize)> for ARIMAOrder {
    fn from((p, d, q): (usize, usize, usize)) -> Self {
        Self::new(p, d, q)
    }
}

impl fmt::Display for ARIMAOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)
    }
}

/// ARIMA forecasting model.
///
/// ARIMA(p, d, q) combines:
/// - AR(p): Autoregressive component
/// - I(d): Differencing for stationarity
/// - MA(q): Moving average component
///
/// Parameters are estimated by conditional maximum likelihood under
/// Gaussian innovations, with pre-sample deviations and errors set to zero.
#[derive(Debug, Clone)]
pub struct ARIMA {
    order: ARIMAOrder,
    ar_coefficients: Vec<f64>,
    ma_coefficients: Vec<f64>,
    /// Mean of the series; zero when `d > 0`.
    intercept: f64,
    /// Original series (for integration).
    original: Option<Vec<f64>>,
    differenced: Option<Vec<f64>>,
    /// One-step predictions on the original scale, aligned with `original[d..]`.
    fitted_levels: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
    sigma2: Option<f64>,
    log_likelihood: Option<f64>,
    aic: Option<f64>,
    bic: Option<f64>,
    converged: bool,
}

impl ARIMA {
    /// Create a new ARIMA model.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self::with_order(ARIMAOrder::new(p, d, q))
    }

    pub fn with_order(order: ARIMAOrder) -> Self {
        Self {
            order,
            ar_coefficients: vec![],
            ma_coefficients: vec![],
            intercept: 0.0,
            original: None,
            differenced: None,
            fitted_levels: None,
            residuals: None,
            sigma2: None,
            log_likelihood: None,
            aic: None,
            bic: None,
            converged: false,
        }
    }

    /// Create an AR(p) model (ARIMA with d=0, q=0).
    pub fn ar(p: usize) -> Self {
        Self::new(p, 0, 0)
    }

    /// Create an MA(q) model (ARIMA with p=0, d=0).
    pub fn ma(q: usize) -> Self {
        Self::new(0, 0, q)
    }

    pub fn order(&self) -> ARIMAOrder {
        self.order
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar_coefficients
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma_coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Innovation variance estimate.
    pub fn sigma2(&self) -> Option<f64> {
        self.sigma2
    }

    /// Maximized conditional log-likelihood.
    pub fn log_likelihood(&self) -> Option<f64> {
        self.log_likelihood
    }

    pub fn aic(&self) -> Option<f64> {
        self.aic
    }

    pub fn bic(&self) -> Option<f64> {
        self.bic
    }

    /// Whether the optimizer met its tolerance before the iteration limit.
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// One-step prediction errors on the differenced series.
    ///
    /// Lags before the start of the series contribute nothing.
    fn one_step_residuals(diff_series: &[f64], ar: &[f64], ma: &[f64], intercept: f64) -> Vec<f64> {
        let n = diff_series.len();
        let mut residuals: Vec<f64> = Vec::with_capacity(n);

        for t in 0..n {
            let mut pred = intercept;

            for (i, phi) in ar.iter().enumerate().take(t) {
                pred += phi * (diff_series[t - 1 - i] - intercept);
            }
            for (i, theta) in ma.iter().enumerate().take(t) {
                pred += theta * residuals[t - 1 - i];
            }

            residuals.push(diff_series[t] - pred);
        }

        residuals
    }

    /// Conditional sum of squares, skipping the first `p` residuals.
    fn calculate_css(diff_series: &[f64], ar: &[f64], ma: &[f64], intercept: f64) -> f64 {
        let residuals = Self::one_step_residuals(diff_series, ar, ma, intercept);
        residuals[ar.len()..].iter().map(|e| e * e).sum()
    }

    /// Concentrated Gaussian negative log-likelihood, up to a constant.
    fn neg_log_likelihood(css: f64, n_eff: f64) -> f64 {
        0.5 * n_eff * (css / n_eff).max(f64::MIN_POSITIVE).ln()
    }

    /// Estimate parameters by conditional maximum likelihood.
    fn estimate_parameters(&mut self, diff_series: &[f64]) -> Result<()> {
        let p = self.order.p;
        let q = self.order.q;
        let has_intercept = self.order.has_intercept();
        let c = usize::from(has_intercept);

        let mean = if has_intercept {
            diff_series.iter().sum::<f64>() / diff_series.len() as f64
        } else {
            0.0
        };

        if p == 0 && q == 0 {
            self.intercept = mean;
            self.ar_coefficients = vec![];
            self.ma_coefficients = vec![];
            self.converged = true;
            return Ok(());
        }

        let n_eff = (diff_series.len() - p) as f64;

        let mut initial = vec![0.0; self.order.num_params()];
        if has_intercept {
            initial[0] = mean;
        }
        for i in 0..p {
            initial[c + i] = 0.1 / (i + 1) as f64;
        }
        for i in 0..q {
            initial[c + p + i] = 0.1 / (i + 1) as f64;
        }

        // Coefficients stay inside the stationary / invertible region
        let mut bounds = vec![(f64::NEG_INFINITY, f64::INFINITY); c];
        bounds.extend(std::iter::repeat((-0.99, 0.99)).take(p + q));

        let config = NelderMeadConfig {
            max_iter: 1000,
            tolerance: 1e-8,
            ..Default::default()
        };

        let result = nelder_mead(
            |params| {
                let (intercept, ar, ma) = unpack(params, has_intercept, p);
                Self::neg_log_likelihood(Self::calculate_css(diff_series, ar, ma, intercept), n_eff)
            },
            &initial,
            Some(&bounds),
            config,
        );

        if !result.optimal_value.is_finite() || result.optimal_point.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::ComputationError(format!(
                "{} likelihood optimization reached a non-finite optimum",
                self.order
            )));
        }

        let (intercept, ar, ma) = unpack(&result.optimal_point, has_intercept, p);
        self.intercept = intercept;
        self.ar_coefficients = ar.to_vec();
        self.ma_coefficients = ma.to_vec();
        self.converged = result.converged;
        Ok(())
    }

    /// Calculate fitted values, residuals and information criteria.
    fn calculate_fitted(&mut self, original: &[f64], diff_series: &[f64]) {
        let d = self.order.d;
        let p = self.order.p;

        let residuals = Self::one_step_residuals(
            diff_series,
            &self.ar_coefficients,
            &self.ma_coefficients,
            self.intercept,
        );

        // y[t+d] minus the one-step error is the level-scale prediction.
        let fitted_levels = original[d..]
            .iter()
            .zip(&residuals)
            .map(|(y, e)| y - e)
            .collect();

        let conditional = &residuals[p..];
        let n_eff = conditional.len() as f64;
        let sigma2 = conditional.iter().map(|e| e * e).sum::<f64>() / n_eff;
        let ll = -0.5
            * n_eff
            * (1.0 + (2.0 * std::f64::consts::PI).ln() + sigma2.max(f64::MIN_POSITIVE).ln());
        let k = self.order.num_params() as f64;

        self.sigma2 = Some(sigma2);
        self.log_likelihood = Some(ll);
        self.aic = Some(-2.0 * ll + 2.0 * k);
        self.bic = Some(-2.0 * ll + k * n_eff.ln());
        self.fitted_levels = Some(fitted_levels);
        self.residuals = Some(residuals);
    }

    /// MA(∞) weights of the integrated model, `psi_0 = 1`.
    ///
    /// The AR polynomial is multiplied by `(1 - B)^d` first, so the weights
    /// describe forecast error growth on the original scale.
    pub fn psi_weights(&self, horizon: usize) -> Vec<f64> {
        if horizon == 0 {
            return Vec::new();
        }

        // phi(B) (1 - B)^d, lowest power first
        let mut ar_poly = vec![1.0];
        ar_poly.extend(self.ar_coefficients.iter().map(|phi| -phi));
        let diff_poly = differencing_polynomial(self.order.d);
        let mut product = vec![0.0; ar_poly.len() + diff_poly.len() - 1];
        for (i, a) in ar_poly.iter().enumerate() {
            for (j, b) in diff_poly.iter().enumerate() {
                product[i + j] += a * b;
            }
        }
        let phi_star: Vec<f64> = product[1..].iter().map(|c| -c).collect();

        let mut psi = Vec::with_capacity(horizon);
        psi.push(1.0);
        for j in 1..horizon {
            let mut value = self.ma_coefficients.get(j - 1).copied().unwrap_or(0.0);
            for (i, phi) in phi_star.iter().enumerate().take(j) {
                value += phi * psi[j - 1 - i];
            }
            psi.push(value);
        }
        psi
    }
}

/// Split an optimizer vector into `(intercept, ar, ma)`.
fn unpack(params: &[f64], has_intercept: bool, p: usize) -> (f64, &[f64], &[f64]) {
    let c = usize::from(has_intercept);
    let intercept = if has_intercept { params[0] } else { 0.0 };
    (intercept, &params[c..c + p], &params[c + p..])
}

impl Default for ARIMA {
    fn default() -> Self {
        Self::with_order(ARIMAOrder::default())
    }
}

impl Forecaster for ARIMA {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let values = series.values();
        if values.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        let min_len = self.order.min_length();
        if values.len() < min_len {
            return Err(ForecastError::InsufficientData {
                needed: min_len,
                got: values.len(),
            });
        }
        if series.has_missing_values() {
            return Err(ForecastError::InvalidParameter(
                "series contains non-finite values".to_string(),
            ));
        }

        let diff_series = difference(values, self.order.d);
        self.estimate_parameters(&diff_series)?;
        self.calculate_fitted(values, &diff_series);
        self.original = Some(values.to_vec());
        self.differenced = Some(diff_series);

        debug!(
            order = %self.order,
            intercept = self.intercept,
            ar = ?self.ar_coefficients,
            ma = ?self.ma_coefficients,
            sigma2 = self.sigma2,
            converged = self.converged,
            "fitted arima"
        );

        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let original = self.original.as_ref().ok_or(ForecastError::FitRequired)?;
        let diff_series = self.differenced.as_ref().ok_or(ForecastError::FitRequired)?;
        let residuals = self.residuals.as_ref().ok_or(ForecastError::FitRequired)?;

        if horizon == 0 {
            return Ok(Forecast::new());
        }

        let mut extended_diff = diff_series.clone();
        let mut extended_residuals = residuals.clone();

        for _ in 0..horizon {
            let t = extended_diff.len();
            let mut pred = self.intercept;

            for (i, phi) in self.ar_coefficients.iter().enumerate() {
                pred += phi * (extended_diff[t - 1 - i] - self.intercept);
            }
            // Future errors have zero expectation
            for (i, theta) in self.ma_coefficients.iter().enumerate() {
                pred += theta * extended_residuals[t - 1 - i];
            }

            extended_diff.push(pred);
            extended_residuals.push(0.0);
        }

        let forecast_diff = &extended_diff[diff_series.len()..];
        let predictions = integrate(forecast_diff, original, self.order.d);

        Ok(Forecast::from_values(predictions))
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        if !(level > 0.0 && level < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "interval level must be in (0, 1), got {}",
                level
            )));
        }
        let forecast = self.predict(horizon)?;
        let sigma2 = self.sigma2.ok_or(ForecastError::FitRequired)?;

        if horizon == 0 {
            return Ok(forecast);
        }

        let z = quantile_normal((1.0 + level) / 2.0);
        let preds = forecast.mean();

        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);
        let mut cumulative = 0.0;

        for (pred, psi) in preds.iter().zip(self.psi_weights(horizon)) {
            cumulative += psi * psi;
            let se = (sigma2 * cumulative).sqrt();
            lower.push(pred - z * se);
            upper.push(pred + z * se);
        }

        Forecast::from_values_with_intervals(preds.to_vec(), lower, upper, level)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted_levels.as_deref()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn name(&self) -> &str {
        "ARIMA"
    }
}
