//! # biosignal-features
//!
//! Rolling-window statistics over physiological signals and ARIMA model
//! fitting with diagnostic plots.
//!
//! - [`features`]: twelve trailing time-window statistics per numeric
//!   signal column, with configurable trimming of undefined rows.
//! - [`fitter`]: fits ARIMA(p,d,q), forecasts with prediction intervals and
//!   writes fit, residual and forecast PNGs.

#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::needless_range_loop)]

pub mod core;
pub mod error;
pub mod features;
pub mod fitter;
pub mod models;
pub mod plot;
pub mod utils;
pub mod validation;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::core::{Forecast, SeriesIndex, SignalTable, TimeSeries};
    pub use crate::error::{ForecastError, Result};
    pub use crate::features::{extract_features, FeatureConfig, FeatureTable, TrimPolicy};
    pub use crate::fitter::{fit_arima, fit_arima_with_config, FitConfig, FittedModel};
    pub use crate::models::arima::{ARIMAOrder, ARIMA};
    pub use crate::models::Forecaster;
}
