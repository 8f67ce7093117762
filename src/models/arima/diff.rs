//! Differencing utilities for ARIMA models.

/// Apply differencing to a time series.
///
/// # Arguments
/// * `series` - The input series
/// * `d` - Differencing order (number of times to difference)
///
/// # Returns
/// The differenced series.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    if d == 0 || series.is_empty() {
        return series.to_vec();
    }

    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= 1 {
            return Vec::new();
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Integrate (reverse differencing) values that continue a differenced series.
///
/// # Arguments
/// * `differenced` - Values on the d-times differenced scale, following the end of `original`
/// * `original` - The original series (needed for initial values)
/// * `d` - Differencing order used
pub fn integrate(differenced: &[f64], original: &[f64], d: usize) -> Vec<f64> {
    if d == 0 || differenced.is_empty() {
        return differenced.to_vec();
    }

    let mut result = differenced.to_vec();

    for level in (0..d).rev() {
        // Last observed value at this differencing level
        let init_value = difference(original, level).last().copied().unwrap_or(0.0);

        let mut cumsum = init_value;
        for value in result.iter_mut() {
            cumsum += *value;
            *value = cumsum;
        }
    }

    result
}

/// Coefficients of the differencing operator `(1 - B)^d`, lowest power first.
pub fn differencing_polynomial(d: usize) -> Vec<f64> {
    let mut poly = vec![1.0];
    for _ in 0..d {
        let mut next = vec![0.0; poly.len() + 1];
        for (k, &c) in poly.iter().enumerate() {
            next[k] += c;
            next[k + 1] -= c;
        }
        poly = next;
    }
    poly
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn difference_order_0() {
        let series = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(difference(&series, 0), series);
    }

    #[test]
    fn difference_order_1() {
        let series = vec![1.0, 3.0, 6.0, 10.0, 15.0];
        assert_eq!(difference(&series, 1), vec![2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn difference_order_2() {
        let series = vec![1.0, 3.0, 6.0, 10.0, 15.0];
        assert_eq!(difference(&series, 2), vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn difference_too_short() {
        assert!(difference(&[1.0], 1).is_empty());
        assert!(difference(&[], 1).is_empty());
    }

    #[test]
    fn integrate_reverses_difference() {
        let original = vec![10.0, 12.0, 15.0, 19.0, 24.0];
        let integrated = integrate(&[6.0, 7.0], &original, 1);

        // Continues from the last value: 24 + 6 = 30, 30 + 7 = 37
        assert_relative_eq!(integrated[0], 30.0, epsilon = 1e-10);
        assert_relative_eq!(integrated[1], 37.0, epsilon = 1e-10);
    }

    #[test]
    fn integrate_order_2_continues_quadratic() {
        // Second differences of triangular numbers are all 1.
        let original = vec![1.0, 3.0, 6.0, 10.0, 15.0];
        let integrated = integrate(&[1.0, 1.0], &original, 2);

        assert_relative_eq!(integrated[0], 21.0, epsilon = 1e-10);
        assert_relative_eq!(integrated[1], 28.0, epsilon = 1e-10);
    }

    #[test]
    fn differencing_polynomial_binomial_coefficients() {
        assert_eq!(differencing_polynomial(0), vec![1.0]);
        assert_eq!(differencing_polynomial(1), vec![1.0, -1.0]);
        assert_eq!(differencing_polynomial(2), vec![1.0, -2.0, 1.0]);
    }
}
