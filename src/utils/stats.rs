//! Statistical utility functions.

use statrs::distribution::{ChiSquared, ContinuousCDF, Normal};

/// Quantile function of the standard normal distribution.
///
/// # Example
/// ```
/// use biosignal_features::utils::quantile_normal;
///
/// // 95% interval level -> z ≈ 1.96
/// let z = quantile_normal(0.975);
/// assert!((z - 1.959964).abs() < 1e-6);
/// ```
pub fn quantile_normal(p: f64) -> f64 {
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }
    match Normal::new(0.0, 1.0) {
        Ok(normal) => normal.inverse_cdf(p),
        Err(_) => f64::NAN,
    }
}

/// Upper tail probability `P(X > x)` of a chi-squared variable with `df` degrees of freedom.
pub fn chi_squared_sf(x: f64, df: usize) -> f64 {
    if df == 0 {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 1.0;
    }
    match ChiSquared::new(df as f64) {
        Ok(chi2) => (1.0 - chi2.cdf(x)).clamp(0.0, 1.0),
        Err(_) => f64::NAN,
    }
}

/// Calculate the mean of a slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample autocorrelation function for lags `0..=nlags`.
///
/// Uses the biased estimator (denominator `n` at every lag), so the
/// resulting sequence is positive semi-definite. Lags at or beyond the
/// series length are `NaN`; a constant series has `NaN` beyond lag 0.
pub fn acf(values: &[f64], nlags: usize) -> Vec<f64> {
    let n = values.len();
    if n == 0 {
        return vec![f64::NAN; nlags + 1];
    }

    let m = mean(values);
    let centered: Vec<f64> = values.iter().map(|x| x - m).collect();
    let c0: f64 = centered.iter().map(|x| x * x).sum();

    (0..=nlags)
        .map(|lag| {
            if lag == 0 {
                1.0
            } else if lag >= n || c0 == 0.0 {
                f64::NAN
            } else {
                let ck: f64 = centered[lag..]
                    .iter()
                    .zip(&centered)
                    .map(|(a, b)| a * b)
                    .sum();
                ck / c0
            }
        })
        .collect()
}

/// Partial autocorrelation function for lags `0..=nlags`.
///
/// Solves the Yule-Walker equations recursively (Durbin-Levinson) from
/// [`acf`]. Once the recursion degenerates the remaining lags are `NaN`.
pub fn pacf(values: &[f64], nlags: usize) -> Vec<f64> {
    let r = acf(values, nlags);
    let mut out = vec![f64::NAN; nlags + 1];
    out[0] = 1.0;
    if nlags == 0 || r.get(1).is_none_or(|v| v.is_nan()) {
        return out;
    }

    let mut phi = vec![r[1]];
    out[1] = r[1];
    let mut error = 1.0 - r[1] * r[1];

    for k in 2..=nlags {
        if r[k].is_nan() || error.abs() < 1e-12 {
            break;
        }
        let num = r[k] - (1..k).map(|j| phi[j - 1] * r[k - j]).sum::<f64>();
        let reflection = num / error;

        let mut next: Vec<f64> = (1..k)
            .map(|j| phi[j - 1] - reflection * phi[k - j - 1])
            .collect();
        next.push(reflection);

        phi = next;
        error *= 1.0 - reflection * reflection;
        out[k] = reflection;
    }

    out
}
