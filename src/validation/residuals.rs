//! Whiteness checks for model residuals.

use crate::utils::stats::{acf, chi_squared_sf};

/// Ljung-Box portmanteau test result.
#[derive(Debug, Clone, PartialEq)]
pub struct LjungBoxResult {
    /// Test statistic Q
    pub statistic: f64,
    /// Upper tail chi-squared probability of `statistic`
    pub p_value: f64,
    /// Number of autocorrelation lags summed
    pub lags: usize,
    /// Degrees of freedom after removing fitted parameters
    pub df: usize,
}

impl LjungBoxResult {
    /// True when the null of no autocorrelation is not rejected at `alpha`.
    pub fn is_white_noise(&self, alpha: f64) -> bool {
        self.p_value > alpha
    }
}

/// Default number of lags for `n` residuals: `min(10, n / 5)`, at least one.
pub fn default_lags(n: usize) -> usize {
    10.min(n / 5).max(1)
}

/// Ljung-Box test for autocorrelation in residuals.
///
/// `Q = n (n + 2) Σ_{k=1..h} r_k² / (n − k)`, compared against a
/// chi-squared distribution with `h − fitted_params` degrees of freedom
/// (never below one). Non-finite residuals are ignored.
///
/// # Arguments
/// * `residuals` - Model residuals
/// * `lags` - Number of lags to include (default: [`default_lags`])
/// * `fitted_params` - Number of estimated ARMA coefficients, usually `p + q`
pub fn ljung_box(residuals: &[f64], lags: Option<usize>, fitted_params: usize) -> LjungBoxResult {
    let values: Vec<f64> = residuals.iter().copied().filter(|v| v.is_finite()).collect();
    let n = values.len();

    if n < 3 {
        return LjungBoxResult {
            statistic: f64::NAN,
            p_value: f64::NAN,
            lags: 0,
            df: 0,
        };
    }

    let lags = lags.unwrap_or_else(|| default_lags(n)).clamp(1, n - 1);
    let df = lags.saturating_sub(fitted_params).max(1);
    let r = acf(&values, lags);

    // Constant residuals carry no autocorrelation.
    if r[1].is_nan() {
        return LjungBoxResult {
            statistic: 0.0,
            p_value: 1.0,
            lags,
            df,
        };
    }

    let nf = n as f64;
    let q = nf
        * (nf + 2.0)
        * (1..=lags)
            .map(|k| r[k] * r[k] / (nf - k as f64))
            .sum::<f64>();

    LjungBoxResult {
        statistic: q,
        p_value: chi_squared_sf(q, df),
        lags,
        df,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn noise(n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect()
    }

    #[test]
    fn ljung_box_white_noise_passes() {
        let result = ljung_box(&noise(200, 3), Some(10), 0);

        assert_eq!(result.lags, 10);
        assert_eq!(result.df, 10);
        assert!(result.statistic >= 0.0);
        assert!(result.is_white_noise(0.001), "p = {}", result.p_value);
    }

    #[test]
    fn ljung_box_detects_autocorrelation() {
        let residuals: Vec<f64> = (0..100).map(|i| (i as f64 * 0.2).sin()).collect();
        let result = ljung_box(&residuals, None, 2);

        assert_eq!(result.lags, 10);
        assert_eq!(result.df, 8);
        assert!(result.p_value < 0.01);
        assert!(!result.is_white_noise(0.05));
    }

    #[test]
    fn ljung_box_matches_hand_computation() {
        // acf lag 1 of [1, 2, 3, 4] is 0.25: Q = 4 * 6 * 0.0625 / 3 = 0.5
        let result = ljung_box(&[1.0, 2.0, 3.0, 4.0], Some(1), 0);
        assert_relative_eq!(result.statistic, 0.5, epsilon = 1e-12);
        assert_relative_eq!(result.p_value, chi_squared_sf(0.5, 1), epsilon = 1e-12);
    }

    #[test]
    fn ljung_box_default_lags() {
        assert_eq!(default_lags(49), 9);
        assert_eq!(default_lags(200), 10);
        assert_eq!(default_lags(4), 1);
    }

    #[test]
    fn ljung_box_edge_cases() {
        let short = ljung_box(&[1.0, 2.0], None, 0);
        assert!(short.statistic.is_nan());

        let constant = ljung_box(&[0.5; 20], None, 1);
        assert_eq!(constant.statistic, 0.0);
        assert_eq!(constant.p_value, 1.0);
        assert_eq!(constant.df, 3);
    }
}
