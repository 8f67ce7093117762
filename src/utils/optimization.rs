//! Derivative-free minimization used for likelihood estimation.

use std::cmp::Ordering;

/// Result of Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    /// The best vertex found.
    pub optimal_point: Vec<f64>,
    /// The objective function value at the best vertex.
    pub optimal_value: f64,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Whether the simplex met the tolerance before `max_iter`.
    pub converged: bool,
}

/// Configuration for Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Convergence tolerance on both objective spread and simplex size.
    pub tolerance: f64,
    /// Reflection coefficient (default: 1.0).
    pub alpha: f64,
    /// Expansion coefficient (default: 2.0).
    pub gamma: f64,
    /// Contraction coefficient (default: 0.5).
    pub rho: f64,
    /// Shrinkage coefficient (default: 0.5).
    pub sigma: f64,
    /// Relative step for the initial simplex (default: 0.05).
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-8,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.05,
        }
    }
}

impl NelderMeadConfig {
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
}

/// Minimize `objective` with the Nelder-Mead simplex method.
///
/// Every candidate vertex is clamped into `bounds` (one `(min, max)` pair
/// per dimension) before it is evaluated.
///
/// # Example
/// ```
/// use biosignal_features::utils::optimization::{nelder_mead, NelderMeadConfig};
///
/// // Minimize (x-2)^2 + (y-3)^2
/// let result = nelder_mead(
///     |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
///     &[0.0, 0.0],
///     None,
///     NelderMeadConfig::default(),
/// );
///
/// assert!(result.converged);
/// assert!((result.optimal_point[0] - 2.0).abs() < 0.01);
/// assert!((result.optimal_point[1] - 3.0).abs() < 0.01);
/// ```
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: NelderMeadConfig,
) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    if n == 0 {
        return NelderMeadResult {
            optimal_point: vec![],
            optimal_value: f64::NAN,
            iterations: 0,
            converged: false,
        };
    }

    let clamp = |point: Vec<f64>| -> Vec<f64> {
        match bounds {
            None => point,
            Some(b) => point
                .into_iter()
                .enumerate()
                .map(|(i, x)| b.get(i).map_or(x, |&(lo, hi)| x.clamp(lo, hi)))
                .collect(),
        }
    };
    let evaluate = |point: Vec<f64>| -> (Vec<f64>, f64) {
        let point = clamp(point);
        let value = objective(&point);
        (point, value)
    };

    let mut simplex: Vec<(Vec<f64>, f64)> = Vec::with_capacity(n + 1);
    simplex.push(evaluate(initial.to_vec()));
    for i in 0..n {
        let mut vertex = initial.to_vec();
        vertex[i] += if initial[i].abs() > 1e-10 {
            config.initial_step * initial[i].abs()
        } else {
            config.initial_step
        };
        simplex.push(evaluate(vertex));
    }

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        iterations += 1;

        simplex.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        let best = simplex[0].1;
        let second_worst = simplex[n - 1].1;
        let worst = simplex[n].1;

        let centroid = centroid(&simplex[..n]);
        let spread = worst - best;
        let size = simplex
            .iter()
            .map(|(v, _)| distance(v, &centroid))
            .fold(0.0, f64::max);
        if spread < config.tolerance || size < config.tolerance {
            converged = true;
            break;
        }

        let reflected = evaluate(towards(&centroid, &simplex[n].0, -config.alpha));

        if reflected.1 < best {
            let expanded = evaluate(towards(&centroid, &reflected.0, config.gamma));
            simplex[n] = if expanded.1 < reflected.1 {
                expanded
            } else {
                reflected
            };
            continue;
        }
        if reflected.1 < second_worst {
            simplex[n] = reflected;
            continue;
        }

        let (contracted, accept) = if reflected.1 < worst {
            let outside = evaluate(towards(&centroid, &reflected.0, config.rho));
            let accept = outside.1 <= reflected.1;
            (outside, accept)
        } else {
            let inside = evaluate(towards(&centroid, &simplex[n].0, config.rho));
            let accept = inside.1 < worst;
            (inside, accept)
        };
        if accept {
            simplex[n] = contracted;
            continue;
        }

        let anchor = simplex[0].0.clone();
        for vertex in simplex.iter_mut().skip(1) {
            *vertex = evaluate(towards(&anchor, &vertex.0, config.sigma));
        }
    }

    let (optimal_point, optimal_value) = simplex
        .into_iter()
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
        .unwrap_or((initial.to_vec(), f64::NAN));

    NelderMeadResult {
        optimal_point,
        optimal_value,
        iterations,
        converged,
    }
}

fn centroid(vertices: &[(Vec<f64>, f64)]) -> Vec<f64> {
    let mut centre = vec![0.0; vertices[0].0.len()];
    for (vertex, _) in vertices {
        for (c, x) in centre.iter_mut().zip(vertex) {
            *c += x;
        }
    }
    let count = vertices.len() as f64;
    centre.iter_mut().for_each(|c| *c /= count);
    centre
}

/// `origin + t * (point - origin)`; negative `t` reflects through `origin`.
fn towards(origin: &[f64], point: &[f64], t: f64) -> Vec<f64> {
    origin
        .iter()
        .zip(point)
        .map(|(o, p)| o + t * (p - o))
        .collect()
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}
