//! Rolling-window feature extraction.
//!
//! Every numeric column of a [`SignalTable`](crate::core::SignalTable)
//! produces twelve columns named `{signal}_{stat}`:
//! mean, std, min, max, range, median, q25, q75, iqr, skew, kurt, autocorr.
//!
//! # Example
//!
//! ```
//! use biosignal_features::core::SignalTable;
//! use biosignal_features::features::{extract_features, FeatureConfig};
//! use chrono::{Duration, TimeZone, Utc};
//!
//! let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//! let timestamps: Vec<_> = (0..30).map(|i| base + Duration::seconds(i)).collect();
//! let hr: Vec<f64> = (0..30).map(|i| 60.0 + (i as f64 * 0.4).sin()).collect();
//!
//! let table = SignalTable::builder()
//!     .timestamps(timestamps)
//!     .numeric("hr", hr)
//!     .build()
//!     .unwrap();
//!
//! let features = extract_features(&table, &FeatureConfig::new(10)).unwrap();
//! assert_eq!(features.num_columns(), 12);
//! assert!(features.column("hr_autocorr").is_some());
//! ```

mod extractor;
pub mod stats;
mod table;
pub mod window;

pub use extractor::{extract_features, FeatureConfig, FeatureExtractor, TrimPolicy};
pub use stats::{Statistic, UndefinedReason, WindowSummary, WindowValue};
pub use table::FeatureTable;
