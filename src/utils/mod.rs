//! Numerical utilities shared by the model and diagnostics code.

pub mod optimization;
pub mod stats;

pub use optimization::{nelder_mead, NelderMeadConfig, NelderMeadResult};
pub use stats::{acf, chi_squared_sf, pacf, quantile_normal};
