//! ARIMA (Autoregressive Integrated Moving Average) models.
//!
//! Provides the (p, d, q) model used by the fitter plus the differencing
//! helpers it is built on.

mod diff;
mod model;

pub use diff::{difference, differencing_polynomial, integrate};
pub use model::{ARIMAOrder, ARIMA};
