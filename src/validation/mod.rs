//! Residual diagnostics for fitted models.
//!
//! # Example
//!
//! ```
//! use biosignal_features::validation::ljung_box;
//!
//! let residuals = vec![0.1, -0.2, 0.15, -0.1, 0.05, -0.08, 0.12, -0.15, 0.1, -0.05];
//! let lb = ljung_box(&residuals, Some(3), 0);
//! assert_eq!(lb.lags, 3);
//! ```

mod residuals;

pub use residuals::{default_lags, ljung_box, LjungBoxResult};
