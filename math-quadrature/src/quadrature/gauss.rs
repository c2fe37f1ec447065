//! Gauss-Legendre and Gauss-Jacobi points and weights
//!
//! Nodes are computed for any point count rather than read from tables, so
//! rules of arbitrary order can be built on demand. Both generators return
//! nodes in ascending order on [-1, 1].

use crate::config::QuadratureConfig;
use crate::error::{QuadratureError, Result};
use std::f64::consts::PI;

/// Newton refinement limits shared by the generators
#[derive(Debug, Clone, Copy)]
pub(crate) struct NewtonSettings {
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl From<&QuadratureConfig> for NewtonSettings {
    fn from(config: &QuadratureConfig) -> Self {
        Self {
            tolerance: config.newton_tolerance,
            max_iterations: config.max_newton_iterations,
        }
    }
}

impl Default for NewtonSettings {
    fn default() -> Self {
        Self::from(&QuadratureConfig::default())
    }
}

/// 1D Gauss-Legendre quadrature on [-1, 1]
///
/// Returns `(points, weights)` for the `n`-point rule, which integrates
/// polynomials of degree `2n - 1` exactly. `n == 0` is rejected.
pub fn gauss_legendre(n: usize) -> Result<(Vec<f64>, Vec<f64>)> {
    gauss_legendre_with(n, NewtonSettings::default())
}

/// Locations of the `n`-point Gauss-Legendre rule, without weights
pub fn gauss_legendre_locations(n: usize) -> Result<Vec<f64>> {
    gauss_legendre(n).map(|(x, _)| x)
}

/// 1D Gauss-Jacobi quadrature on [-1, 1] for the weight `(1 - x)^alpha`
///
/// Integrates `(1 - x)^alpha * p(x)` exactly for polynomials `p` of degree
/// `2n - 1`. With `alpha == 0` this is the Gauss-Legendre rule.
pub fn gauss_jacobi(n: usize, alpha: u32) -> Result<(Vec<f64>, Vec<f64>)> {
    gauss_jacobi_with(n, alpha, NewtonSettings::default())
}

pub(crate) fn gauss_legendre_with(
    n: usize,
    settings: NewtonSettings,
) -> Result<(Vec<f64>, Vec<f64>)> {
    if n == 0 {
        return Err(QuadratureError::InvalidPointCount { n });
    }

    let mut x = vec![0.0; n];
    let mut w = vec![0.0; n];
    let nf = n as f64;

    // Roots are symmetric, so only the positive half is refined
    for i in 0..n.div_ceil(2) {
        let mut z = if 2 * i + 1 == n {
            0.0
        } else {
            (PI * (i as f64 + 0.75) / (nf + 0.5)).cos()
        };

        let mut converged = false;
        for _ in 0..settings.max_iterations {
            let (p, dp) = legendre(n, z);
            let dz = p / dp;
            z -= dz;
            if dz.abs() <= settings.tolerance {
                converged = true;
                break;
            }
        }
        if !converged {
            log::warn!(
                "Gauss-Legendre node {} of {} did not converge in {} iterations",
                i,
                n,
                settings.max_iterations
            );
        }

        let (_, dp) = legendre(n, z);
        let weight = 2.0 / ((1.0 - z * z) * dp * dp);
        x[i] = -z;
        x[n - 1 - i] = z;
        w[i] = weight;
        w[n - 1 - i] = weight;
    }

    Ok((x, w))
}

pub(crate) fn gauss_jacobi_with(
    n: usize,
    alpha: u32,
    settings: NewtonSettings,
) -> Result<(Vec<f64>, Vec<f64>)> {
    if n == 0 {
        return Err(QuadratureError::InvalidPointCount { n });
    }
    if alpha == 0 {
        return gauss_legendre_with(n, settings);
    }

    let a = alpha as f64;
    let (diag, offdiag_sq) = jacobi_matrix(n, a);
    let scale = 2f64.powi(alpha as i32 + 1);

    let mut x = Vec::with_capacity(n);
    let mut w = Vec::with_capacity(n);

    for k in 0..n {
        let mut z = bisect_eigenvalue(&diag, &offdiag_sq, k);

        let mut converged = false;
        for _ in 0..settings.max_iterations {
            let (p, dp) = jacobi(n, a, z);
            let dz = p / dp;
            z -= dz;
            if dz.abs() <= settings.tolerance {
                converged = true;
                break;
            }
        }
        if !converged {
            log::warn!(
                "Gauss-Jacobi(alpha={}) node {} of {} did not converge in {} iterations",
                alpha,
                k,
                n,
                settings.max_iterations
            );
        }

        let (_, dp) = jacobi(n, a, z);
        x.push(z);
        w.push(scale / ((1.0 - z * z) * dp * dp));
    }

    Ok((x, w))
}

/// Legendre polynomial P_n and its derivative at `x`
fn legendre(n: usize, x: f64) -> (f64, f64) {
    let mut p_prev = 1.0;
    let mut p = x;
    for k in 2..=n {
        let kf = k as f64;
        let p_next = ((2.0 * kf - 1.0) * x * p - (kf - 1.0) * p_prev) / kf;
        p_prev = p;
        p = p_next;
    }
    let dp = n as f64 * (x * p - p_prev) / (x * x - 1.0);
    (p, dp)
}

/// Jacobi polynomial P_n^(a,0) and its derivative at `x`
fn jacobi(n: usize, a: f64, x: f64) -> (f64, f64) {
    let mut p_prev = 1.0;
    let mut p = 0.5 * ((a + 2.0) * x + a);
    for k in 2..=n {
        let kf = k as f64;
        let c = 2.0 * kf + a;
        let lhs = 2.0 * kf * (kf + a) * (c - 2.0);
        let p_next = ((c - 1.0) * (c * (c - 2.0) * x + a * a) * p
            - 2.0 * (kf + a - 1.0) * (kf - 1.0) * c * p_prev)
            / lhs;
        p_prev = p;
        p = p_next;
    }

    let nf = n as f64;
    let c = 2.0 * nf + a;
    let dp = (nf * (a - c * x) * p + 2.0 * (nf + a) * nf * p_prev) / (c * (1.0 - x * x));
    (p, dp)
}

/// Symmetric tridiagonal matrix of the three-term recurrence for P^(a,0)
///
/// Returns the diagonal and the squared off-diagonal.
fn jacobi_matrix(n: usize, a: f64) -> (Vec<f64>, Vec<f64>) {
    let diag = (0..n)
        .map(|k| {
            let c = 2.0 * k as f64 + a;
            -(a * a) / (c * (c + 2.0))
        })
        .collect();

    // offdiag_sq[k] couples rows k-1 and k; entry 0 is unused
    let offdiag_sq = (0..n)
        .map(|k| {
            if k == 0 {
                return 0.0;
            }
            let kf = k as f64;
            let c = 2.0 * kf + a;
            4.0 * kf * kf * (kf + a) * (kf + a) / (c * c * (c * c - 1.0))
        })
        .collect();

    (diag, offdiag_sq)
}

/// Number of eigenvalues of the tridiagonal matrix smaller than `x`
fn sturm_count(diag: &[f64], offdiag_sq: &[f64], x: f64) -> usize {
    let mut count = 0;
    let mut q = 1.0;
    for (k, &d) in diag.iter().enumerate() {
        q = if k == 0 {
            d - x
        } else {
            d - x - offdiag_sq[k] / q
        };
        if q == 0.0 {
            q = -f64::EPSILON;
        }
        if q < 0.0 {
            count += 1;
        }
    }
    count
}

/// The `k`-th smallest eigenvalue, bracketed in [-1, 1]
fn bisect_eigenvalue(diag: &[f64], offdiag_sq: &[f64], k: usize) -> f64 {
    let mut lo = -1.0;
    let mut hi = 1.0;
    for _ in 0..64 {
        let mid = 0.5 * (lo + hi);
        if sturm_count(diag, offdiag_sq, mid) > k {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    0.5 * (lo + hi)
}
