//! Rolling feature extraction over a signal table.

use crate::core::SignalTable;
use crate::error::{ForecastError, Result};
use crate::features::stats::{Statistic, UndefinedReason, WindowSummary, WindowValue};
use crate::features::table::FeatureTable;
use crate::features::window::{rolling_apply, trailing_bounds};
use chrono::Duration;
use tracing::debug;

/// Which rows the extractor drops from its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrimPolicy {
    /// Drop every row holding any undefined feature, whatever the reason.
    #[default]
    AnyUndefined,
    /// Drop only rows whose window lacks history for some feature.
    /// Degenerate values are kept and reported as `NaN`.
    WarmUpOnly,
}

impl TrimPolicy {
    fn drops(&self, value: &WindowValue) -> bool {
        match (self, value.reason()) {
            (_, None) => false,
            (TrimPolicy::AnyUndefined, Some(_)) => true,
            (TrimPolicy::WarmUpOnly, Some(reason)) => {
                reason == UndefinedReason::InsufficientHistory
            }
        }
    }
}

/// Configuration for rolling feature extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureConfig {
    /// Width of the trailing time window (default: 60 seconds).
    pub window: Duration,
    /// Row trimming policy (default: drop any undefined).
    pub trim_policy: TrimPolicy,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            window: Duration::seconds(60),
            trim_policy: TrimPolicy::AnyUndefined,
        }
    }
}

impl FeatureConfig {
    /// Configuration with a window of `seconds`.
    ///
    /// Values beyond the representable duration saturate.
    pub fn new(seconds: i64) -> Self {
        let window = Duration::try_seconds(seconds).unwrap_or(if seconds < 0 {
            Duration::MIN
        } else {
            Duration::MAX
        });
        Self::default().with_window(window)
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn with_trim_policy(mut self, policy: TrimPolicy) -> Self {
        self.trim_policy = policy;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.window <= Duration::zero() {
            return Err(ForecastError::InvalidParameter(format!(
                "window must be positive, got {}s",
                self.window.num_milliseconds() as f64 / 1000.0
            )));
        }
        Ok(())
    }
}

/// Computes twelve rolling statistics for every numeric column.
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    config: FeatureConfig,
}

impl FeatureExtractor {
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Rolling features for every numeric column, before trimming.
    ///
    /// Columns are named `{signal}_{stat}` in schema order, then in
    /// [`Statistic::ALL`] order. Non-numeric columns are skipped.
    pub fn window_values(&self, table: &SignalTable) -> Result<Vec<(String, Vec<WindowValue>)>> {
        self.config.validate()?;

        let bounds = trailing_bounds(table.timestamps(), self.config.window);
        let mut columns = Vec::new();

        for (name, values) in table.numeric_columns() {
            let summaries = rolling_apply(values, &bounds, WindowSummary::compute);
            for stat in Statistic::ALL {
                let column = summaries.iter().map(|s| s.get(stat)).collect();
                columns.push((stat.column_name(name), column));
            }
        }

        debug!(
            rows = table.len(),
            signals = columns.len() / Statistic::ALL.len(),
            skipped = table.num_columns() - columns.len() / Statistic::ALL.len(),
            "computed rolling window values"
        );

        Ok(columns)
    }

    /// Extract rolling features and trim rows per the configured policy.
    pub fn extract(&self, table: &SignalTable) -> Result<FeatureTable> {
        let columns = self.window_values(table)?;
        let policy = self.config.trim_policy;

        // A table without numeric signals has no feature rows.
        let keep: Vec<bool> = (0..table.len())
            .map(|row| !columns.is_empty() && !columns.iter().any(|(_, c)| policy.drops(&c[row])))
            .collect();

        let timestamps = table
            .timestamps()
            .iter()
            .zip(&keep)
            .filter(|(_, &k)| k)
            .map(|(t, _)| *t)
            .collect();

        let columns = columns
            .into_iter()
            .map(|(name, values)| {
                let kept = values
                    .iter()
                    .zip(&keep)
                    .filter(|(_, &k)| k)
                    .map(|(v, _)| v.to_f64())
                    .collect();
                (name, kept)
            })
            .collect();

        let features = FeatureTable::new(timestamps, columns)?;
        debug!(
            input_rows = table.len(),
            output_rows = features.len(),
            dropped = table.len() - features.len(),
            "trimmed feature rows"
        );
        Ok(features)
    }
}

/// Extract rolling features from `table` with `config`.
pub fn extract_features(table: &SignalTable, config: &FeatureConfig) -> Result<FeatureTable> {
    FeatureExtractor::new(config.clone()).extract(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn seconds(n: usize) -> Vec<DateTime<Utc>> {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..n).map(|i| base + Duration::seconds(i as i64)).collect()
    }

    fn wave(n: usize) -> Vec<f64> {
        (0..n).map(|i| 70.0 + 5.0 * (i as f64 * 0.7).sin() + (i % 3) as f64).collect()
    }

    #[test]
    fn constant_signal_yields_empty_output() {
        let table = SignalTable::builder()
            .timestamps(seconds(120))
            .numeric("hr", vec![5.0; 120])
            .build()
            .unwrap();

        let features = extract_features(&table, &FeatureConfig::default()).unwrap();
        assert!(features.is_empty());
        assert_eq!(features.num_columns(), 12);
    }

    #[test]
    fn warm_up_only_policy_keeps_constant_windows() {
        let table = SignalTable::builder()
            .timestamps(seconds(120))
            .numeric("hr", vec![5.0; 120])
            .build()
            .unwrap();
        let config = FeatureConfig::new(60).with_trim_policy(TrimPolicy::WarmUpOnly);

        let features = extract_features(&table, &config).unwrap();
        assert_eq!(features.len(), 117);
        for stat in ["hr_mean", "hr_min", "hr_max", "hr_median", "hr_q25", "hr_q75"] {
            assert!(features.column(stat).unwrap().iter().all(|&v| v == 5.0));
        }
        for stat in ["hr_std", "hr_range", "hr_iqr", "hr_skew"] {
            assert!(features.column(stat).unwrap().iter().all(|&v| v == 0.0));
        }
        assert!(features.column("hr_autocorr").unwrap().iter().all(|v| v.is_nan()));
        assert!(features.column("hr_kurt").unwrap().iter().all(|&v| v == -3.0));
    }

    #[test]
    fn leading_warm_up_rows_are_dropped() {
        let table = SignalTable::builder()
            .timestamps(seconds(100))
            .numeric("hr", wave(100))
            .build()
            .unwrap();

        let features = extract_features(&table, &FeatureConfig::new(60)).unwrap();
        // Kurtosis needs four samples: rows 0..3 are warm-up.
        assert_eq!(features.len(), 97);
        assert_eq!(features.timestamps()[0], table.timestamps()[3]);
    }

    #[test]
    fn non_numeric_columns_are_skipped() {
        let labels: Vec<String> = (0..30).map(|i| format!("label{}", i % 2)).collect();
        let table = SignalTable::builder()
            .timestamps(seconds(30))
            .numeric("hr", wave(30))
            .text("activity", labels)
            .numeric("eda", wave(30).iter().map(|v| v / 10.0).collect())
            .build()
            .unwrap();

        let features = extract_features(&table, &FeatureConfig::new(10)).unwrap();
        assert_eq!(features.num_columns(), 24);
        assert_eq!(features.column_names()[0], "hr_mean");
        assert_eq!(features.column_names()[12], "eda_mean");
        assert!(features.column_names().iter().all(|n| !n.starts_with("activity")));
    }

    #[test]
    fn rows_are_dropped_jointly_across_signals() {
        let mut eda = wave(20);
        // A constant stretch makes eda's autocorrelation undefined at row 12.
        for v in eda.iter_mut().take(13).skip(9) {
            *v = 1.0;
        }
        let table = SignalTable::builder()
            .timestamps(seconds(20))
            .numeric("hr", wave(20))
            .numeric("eda", eda)
            .build()
            .unwrap();

        let features = extract_features(&table, &FeatureConfig::new(4)).unwrap();
        let dropped = table.timestamps()[12];
        assert!(!features.timestamps().contains(&dropped));
        assert!(features.timestamps().contains(&table.timestamps()[11]));
    }

    #[test]
    fn rejects_non_positive_window() {
        let table = SignalTable::builder()
            .timestamps(seconds(3))
            .numeric("hr", vec![1.0, 2.0, 3.0])
            .build()
            .unwrap();

        let result = extract_features(&table, &FeatureConfig::new(0));
        assert!(matches!(result, Err(ForecastError::InvalidParameter(_))));
    }

    #[test]
    fn huge_windows_see_the_whole_history() {
        let table = SignalTable::builder()
            .timestamps(seconds(10))
            .numeric("hr", wave(10))
            .build()
            .unwrap();

        for config in [
            FeatureConfig::default().with_window(Duration::days(100_000_000)),
            FeatureConfig::new(i64::MAX),
        ] {
            let features = extract_features(&table, &config).unwrap();
            assert_eq!(features.len(), 7);
            let expected_mean = wave(10).iter().sum::<f64>() / 10.0;
            let last_mean = *features.column("hr_mean").unwrap().last().unwrap();
            assert!((last_mean - expected_mean).abs() < 1e-12);
        }
        assert!(matches!(
            extract_features(&table, &FeatureConfig::new(i64::MIN)),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn table_without_numeric_columns_yields_nothing() {
        let table = SignalTable::builder()
            .timestamps(seconds(10))
            .text("activity", vec!["rest".to_string(); 10])
            .build()
            .unwrap();

        let features = extract_features(&table, &FeatureConfig::default()).unwrap();
        assert!(features.is_empty());
        assert_eq!(features.num_columns(), 0);
    }

    #[test]
    fn empty_table_yields_empty_output() {
        let table = SignalTable::builder()
            .timestamps(vec![])
            .numeric("hr", vec![])
            .build()
            .unwrap();

        let features = extract_features(&table, &FeatureConfig::default()).unwrap();
        assert!(features.is_empty());
        assert_eq!(features.num_columns(), 12);
    }
}
