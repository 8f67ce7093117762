//! Per-window statistics and the explicit undefined result.

use std::fmt;

/// Why a window statistic has no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UndefinedReason {
    /// The window holds fewer samples than the statistic needs.
    InsufficientHistory,
    /// Enough samples, but the statistic is not defined for them
    /// (zero variance, non-finite result).
    Degenerate,
}

/// Result of a statistic over one window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindowValue {
    Defined(f64),
    Undefined(UndefinedReason),
}

impl WindowValue {
    pub const INSUFFICIENT: WindowValue = WindowValue::Undefined(UndefinedReason::InsufficientHistory);
    pub const DEGENERATE: WindowValue = WindowValue::Undefined(UndefinedReason::Degenerate);

    /// Wrap a computed value; non-finite results are degenerate.
    pub fn from_finite(value: f64) -> Self {
        if value.is_finite() {
            WindowValue::Defined(value)
        } else {
            WindowValue::DEGENERATE
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, WindowValue::Defined(_))
    }

    pub fn value(&self) -> Option<f64> {
        match *self {
            WindowValue::Defined(v) => Some(v),
            WindowValue::Undefined(_) => None,
        }
    }

    pub fn reason(&self) -> Option<UndefinedReason> {
        match *self {
            WindowValue::Defined(_) => None,
            WindowValue::Undefined(reason) => Some(reason),
        }
    }

    /// The value, with `NaN` standing in for undefined.
    pub fn to_f64(&self) -> f64 {
        self.value().unwrap_or(f64::NAN)
    }

    /// Combine two values; undefined wins, insufficient history first.
    fn zip_with(self, other: WindowValue, f: impl FnOnce(f64, f64) -> f64) -> WindowValue {
        match (self, other) {
            (WindowValue::Defined(a), WindowValue::Defined(b)) => WindowValue::from_finite(f(a, b)),
            (WindowValue::Undefined(UndefinedReason::InsufficientHistory), _)
            | (_, WindowValue::Undefined(UndefinedReason::InsufficientHistory)) => {
                WindowValue::INSUFFICIENT
            }
            _ => WindowValue::DEGENERATE,
        }
    }
}

/// The twelve rolling statistics, in output column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Statistic {
    Mean,
    Std,
    Min,
    Max,
    Range,
    Median,
    Q25,
    Q75,
    Iqr,
    Skew,
    Kurt,
    Autocorr,
}

impl Statistic {
    pub const ALL: [Statistic; 12] = [
        Statistic::Mean,
        Statistic::Std,
        Statistic::Min,
        Statistic::Max,
        Statistic::Range,
        Statistic::Median,
        Statistic::Q25,
        Statistic::Q75,
        Statistic::Iqr,
        Statistic::Skew,
        Statistic::Kurt,
        Statistic::Autocorr,
    ];

    /// Column-name suffix: a feature column is `{signal}_{suffix}`.
    pub fn suffix(&self) -> &'static str {
        match self {
            Statistic::Mean => "mean",
            Statistic::Std => "std",
            Statistic::Min => "min",
            Statistic::Max => "max",
            Statistic::Range => "range",
            Statistic::Median => "median",
            Statistic::Q25 => "q25",
            Statistic::Q75 => "q75",
            Statistic::Iqr => "iqr",
            Statistic::Skew => "skew",
            Statistic::Kurt => "kurt",
            Statistic::Autocorr => "autocorr",
        }
    }

    /// Feature column name for a signal.
    pub fn column_name(&self, signal: &str) -> String {
        format!("{signal}_{}", self.suffix())
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// All twelve statistics of one window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowSummary {
    pub mean: WindowValue,
    pub std: WindowValue,
    pub min: WindowValue,
    pub max: WindowValue,
    pub range: WindowValue,
    pub median: WindowValue,
    pub q25: WindowValue,
    pub q75: WindowValue,
    pub iqr: WindowValue,
    pub skew: WindowValue,
    pub kurt: WindowValue,
    pub autocorr: WindowValue,
}

impl WindowSummary {
    /// Summarize the samples of one window, in time order.
    pub fn compute(window: &[f64]) -> Self {
        let mut sorted = window.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let min = first(&sorted);
        let max = last(&sorted);
        let q25 = quantile_sorted(&sorted, 0.25);
        let q75 = quantile_sorted(&sorted, 0.75);

        Self {
            mean: mean(window),
            std: std_dev(window),
            min,
            max,
            range: max.zip_with(min, |hi, lo| hi - lo),
            median: quantile_sorted(&sorted, 0.5),
            q25,
            q75,
            iqr: q75.zip_with(q25, |hi, lo| hi - lo),
            skew: skewness(window),
            kurt: kurtosis(window),
            autocorr: lag1_autocorrelation(window),
        }
    }

    pub fn get(&self, stat: Statistic) -> WindowValue {
        match stat {
            Statistic::Mean => self.mean,
            Statistic::Std => self.std,
            Statistic::Min => self.min,
            Statistic::Max => self.max,
            Statistic::Range => self.range,
            Statistic::Median => self.median,
            Statistic::Q25 => self.q25,
            Statistic::Q75 => self.q75,
            Statistic::Iqr => self.iqr,
            Statistic::Skew => self.skew,
            Statistic::Kurt => self.kurt,
            Statistic::Autocorr => self.autocorr,
        }
    }
}

fn is_constant(window: &[f64]) -> bool {
    window.iter().all(|&x| x == window[0])
}

fn first(sorted: &[f64]) -> WindowValue {
    sorted
        .first()
        .map_or(WindowValue::INSUFFICIENT, |&v| WindowValue::Defined(v))
}

fn last(sorted: &[f64]) -> WindowValue {
    sorted
        .last()
        .map_or(WindowValue::INSUFFICIENT, |&v| WindowValue::Defined(v))
}

/// Arithmetic mean (at least one sample).
pub fn mean(window: &[f64]) -> WindowValue {
    if window.is_empty() {
        return WindowValue::INSUFFICIENT;
    }
    if is_constant(window) {
        return WindowValue::Defined(window[0]);
    }
    WindowValue::from_finite(window.iter().sum::<f64>() / window.len() as f64)
}

/// Sample standard deviation with `n - 1` denominator (at least two samples).
pub fn std_dev(window: &[f64]) -> WindowValue {
    if window.len() < 2 {
        return WindowValue::INSUFFICIENT;
    }
    if is_constant(window) {
        return WindowValue::Defined(0.0);
    }
    let n = window.len() as f64;
    let m = window.iter().sum::<f64>() / n;
    let var = window.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (n - 1.0);
    WindowValue::from_finite(var.sqrt())
}

/// Quantile of sorted samples, linear interpolation between order statistics.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> WindowValue {
    if sorted.is_empty() {
        return WindowValue::INSUFFICIENT;
    }
    let q = q.clamp(0.0, 1.0);
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;

    if lower == upper {
        WindowValue::Defined(sorted[lower])
    } else {
        WindowValue::from_finite(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
    }
}

/// Adjusted Fisher-Pearson sample skewness (at least three samples).
///
/// A constant window has zero skewness.
pub fn skewness(window: &[f64]) -> WindowValue {
    if window.len() < 3 {
        return WindowValue::INSUFFICIENT;
    }
    if is_constant(window) {
        return WindowValue::Defined(0.0);
    }
    let n = window.len() as f64;
    let m = window.iter().sum::<f64>() / n;
    let s = (window.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (n - 1.0)).sqrt();
    if s == 0.0 {
        return WindowValue::Defined(0.0);
    }

    let sum_cubed: f64 = window.iter().map(|x| ((x - m) / s).powi(3)).sum();
    WindowValue::from_finite((n / ((n - 1.0) * (n - 2.0))) * sum_cubed)
}

/// Unbiased sample excess kurtosis (at least four samples).
///
/// A constant window reports -3, the excess kurtosis of a point mass,
/// as pandas' rolling `kurt` does.
pub fn kurtosis(window: &[f64]) -> WindowValue {
    if window.len() < 4 {
        return WindowValue::INSUFFICIENT;
    }
    if is_constant(window) {
        return WindowValue::Defined(-3.0);
    }
    let n = window.len() as f64;
    let m = window.iter().sum::<f64>() / n;
    let s = (window.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (n - 1.0)).sqrt();
    if s == 0.0 {
        return WindowValue::Defined(-3.0);
    }

    let sum_fourth: f64 = window.iter().map(|x| ((x - m) / s).powi(4)).sum();
    let k = (n * (n + 1.0) / ((n - 1.0) * (n - 2.0) * (n - 3.0))) * sum_fourth;
    WindowValue::from_finite(k - (3.0 * (n - 1.0).powi(2)) / ((n - 2.0) * (n - 3.0)))
}

/// Lag-1 autocorrelation by the direct definition.
///
/// `sum((x[t] - m)(x[t-1] - m)) / sum((x[t] - m)^2)`. Needs two samples
/// and at least two distinct values.
pub fn lag1_autocorrelation(window: &[f64]) -> WindowValue {
    if window.len() < 2 {
        return WindowValue::INSUFFICIENT;
    }
    if is_constant(window) {
        return WindowValue::DEGENERATE;
    }

    let m = window.iter().sum::<f64>() / window.len() as f64;
    let denominator: f64 = window.iter().map(|x| (x - m).powi(2)).sum();
    if denominator == 0.0 {
        return WindowValue::DEGENERATE;
    }
    let numerator: f64 = window
        .windows(2)
        .map(|pair| (pair[1] - m) * (pair[0] - m))
        .sum();

    WindowValue::from_finite(numerator / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn defined(v: WindowValue) -> f64 {
        v.value().expect("expected a defined value")
    }

    #[test]
    fn statistic_suffixes_follow_column_order() {
        let suffixes: Vec<&str> = Statistic::ALL.iter().map(|s| s.suffix()).collect();
        assert_eq!(
            suffixes,
            vec![
                "mean", "std", "min", "max", "range", "median", "q25", "q75", "iqr", "skew",
                "kurt", "autocorr"
            ]
        );
        assert_eq!(Statistic::Q25.column_name("hr"), "hr_q25");
    }

    #[test]
    fn basic_statistics_of_small_window() {
        let window = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let summary = WindowSummary::compute(&window);

        assert_relative_eq!(defined(summary.mean), 5.0, epsilon = 1e-12);
        // Sample variance = 32 / 7
        assert_relative_eq!(defined(summary.std), (32.0_f64 / 7.0).sqrt(), epsilon = 1e-12);
        assert_eq!(defined(summary.min), 2.0);
        assert_eq!(defined(summary.max), 9.0);
        assert_eq!(defined(summary.range), 7.0);
        assert_relative_eq!(defined(summary.median), 4.5, epsilon = 1e-12);
        // pos 1.75 -> 4.0, pos 5.25 -> 5.0 + 0.25 * 2.0
        assert_relative_eq!(defined(summary.q25), 4.0, epsilon = 1e-12);
        assert_relative_eq!(defined(summary.q75), 5.5, epsilon = 1e-12);
        assert_relative_eq!(defined(summary.iqr), 1.5, epsilon = 1e-12);
    }

    #[test]
    fn skewness_matches_adjusted_estimator() {
        // Reference: scipy.stats.skew([1, 2, 3, 10], bias=False)
        assert_relative_eq!(
            defined(skewness(&[1.0, 2.0, 3.0, 10.0])),
            1.763_632_614_803_888,
            epsilon = 1e-9
        );
        assert!(defined(skewness(&[1.0, 1.0, 1.0, 2.0, 2.0, 10.0])) > 0.5);
        assert!(defined(skewness(&[1.0, 9.0, 9.0, 10.0, 10.0, 10.0])) < -0.5);
    }

    #[test]
    fn kurtosis_matches_unbiased_excess_estimator() {
        // Reference: scipy.stats.kurtosis([1, 2, 3, 4, 10], bias=False)
        assert_relative_eq!(
            defined(kurtosis(&[1.0, 2.0, 3.0, 4.0, 10.0])),
            3.152,
            epsilon = 1e-9
        );
    }

    #[test]
    fn minimum_sample_counts() {
        assert_eq!(mean(&[]), WindowValue::INSUFFICIENT);
        assert_eq!(std_dev(&[1.0]), WindowValue::INSUFFICIENT);
        assert_eq!(skewness(&[1.0, 2.0]), WindowValue::INSUFFICIENT);
        assert_eq!(kurtosis(&[1.0, 2.0, 3.0]), WindowValue::INSUFFICIENT);
        assert_eq!(lag1_autocorrelation(&[1.0]), WindowValue::INSUFFICIENT);

        let summary = WindowSummary::compute(&[3.0]);
        assert_eq!(summary.mean, WindowValue::Defined(3.0));
        assert_eq!(summary.range, WindowValue::Defined(0.0));
        assert_eq!(summary.std, WindowValue::INSUFFICIENT);
    }

    #[test]
    fn constant_window_statistics() {
        let summary = WindowSummary::compute(&[0.1; 7]);

        assert_eq!(summary.mean, WindowValue::Defined(0.1));
        assert_eq!(summary.median, WindowValue::Defined(0.1));
        assert_eq!(summary.std, WindowValue::Defined(0.0));
        assert_eq!(summary.range, WindowValue::Defined(0.0));
        assert_eq!(summary.iqr, WindowValue::Defined(0.0));
        assert_eq!(summary.skew, WindowValue::Defined(0.0));
        assert_eq!(summary.kurt, WindowValue::Defined(-3.0));
        assert_eq!(summary.autocorr, WindowValue::DEGENERATE);
    }

    #[test]
    fn lag1_autocorrelation_direct_definition() {
        let window = [1.0, 2.0, 3.0, 4.0];
        // numerator 0.75 - 0.25 + 0.75 = 1.25 over denominator 5
        assert_relative_eq!(defined(lag1_autocorrelation(&window)), 0.25, epsilon = 1e-12);

        let alternating: Vec<f64> = (0..20).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        assert!(defined(lag1_autocorrelation(&alternating)) < -0.5);
    }

    #[test]
    fn window_value_conversions() {
        assert!(WindowValue::from_finite(f64::INFINITY) == WindowValue::DEGENERATE);
        assert!(WindowValue::INSUFFICIENT.to_f64().is_nan());
        assert_eq!(WindowValue::Defined(2.0).to_f64(), 2.0);
        assert_eq!(
            WindowValue::DEGENERATE.reason(),
            Some(UndefinedReason::Degenerate)
        );
    }
}
