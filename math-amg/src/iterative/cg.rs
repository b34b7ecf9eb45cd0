//! Preconditioned Conjugate Gradient solver
//!
//! The method of choice for symmetric positive definite systems. With a
//! multigrid preconditioner the iteration count stays nearly independent of
//! the problem size.

use crate::traits::{ComplexField, IdentityPreconditioner, LinearOperator, Preconditioner};
use ndarray::Array1;
use num_traits::{Float, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};

/// `|(u, v)|` below this fraction of `|u| |v|` counts as a breakdown
const BREAKDOWN_TOLERANCE: f64 = 1e-30;

/// CG solver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CgConfig {
    /// Maximum number of iterations
    pub max_iterations: usize,
    /// Relative residual tolerance for convergence
    pub tolerance: f64,
    /// Print progress every N iterations (0 = no output)
    pub print_interval: usize,
}

impl Default for CgConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-8,
            print_interval: 0,
        }
    }
}

/// CG solver result
#[derive(Debug)]
pub struct CgSolution<T: ComplexField> {
    /// Solution vector
    pub x: Array1<T>,
    /// Number of iterations
    pub iterations: usize,
    /// Final relative residual
    pub residual: T::Real,
    /// Whether convergence was achieved
    pub converged: bool,
    /// Relative residual after every iteration
    pub residual_history: Vec<f64>,
}

/// Solve Ax = b with unpreconditioned CG
pub fn cg<T, A>(operator: &A, b: &Array1<T>, config: &CgConfig) -> CgSolution<T>
where
    T: ComplexField,
    A: LinearOperator<T>,
{
    pcg(operator, &IdentityPreconditioner, b, config)
}

/// Solve Ax = b using preconditioned Conjugate Gradients
///
/// Only correct for symmetric (Hermitian) positive definite `A` and `M`.
pub fn pcg<T, A, P>(
    operator: &A,
    preconditioner: &P,
    b: &Array1<T>,
    config: &CgConfig,
) -> CgSolution<T>
where
    T: ComplexField,
    A: LinearOperator<T>,
    P: Preconditioner<T> + ?Sized,
{
    let n = b.len();
    let mut x = Array1::from_elem(n, T::zero());
    let mut residual_history = Vec::new();

    let b_norm = vector_norm(b);
    if b_norm.is_zero() {
        return CgSolution {
            x,
            iterations: 0,
            residual: T::Real::zero(),
            converged: true,
            residual_history,
        };
    }

    let tolerance = T::real_from_f64(config.tolerance);
    let breakdown = T::real_from_f64(BREAKDOWN_TOLERANCE);

    // x = 0, so r = b
    let mut r = b.clone();
    let mut z = preconditioner.apply(&r);
    let mut p = z.clone();
    let mut rho = inner_product(&r, &z);

    for iter in 0..config.max_iterations {
        let q = operator.apply(&p);

        let pq = inner_product(&p, &q);
        if pq.norm() <= breakdown * vector_norm(&p) * vector_norm(&q) {
            log::warn!("CG breakdown at iteration {}: (p, Ap) vanished", iter);
            return CgSolution {
                x,
                iterations: iter,
                residual: vector_norm(&r) / b_norm,
                converged: false,
                residual_history,
            };
        }

        let alpha = rho * pq.inv();
        x.scaled_add(alpha, &p);
        r.scaled_add(-alpha, &q);

        let rel_residual = vector_norm(&r) / b_norm;
        residual_history.push(rel_residual.to_f64().unwrap_or(f64::NAN));

        if config.print_interval > 0 && (iter + 1) % config.print_interval == 0 {
            log::info!(
                "CG iteration {}: relative residual = {:.6e}",
                iter + 1,
                rel_residual.to_f64().unwrap_or(0.0)
            );
        }

        if rel_residual < tolerance {
            return CgSolution {
                x,
                iterations: iter + 1,
                residual: rel_residual,
                converged: true,
                residual_history,
            };
        }

        z = preconditioner.apply(&r);
        let rho_new = inner_product(&r, &z);
        if rho_new.norm() <= breakdown * vector_norm(&r) * vector_norm(&z) {
            log::warn!("CG breakdown at iteration {}: preconditioned residual vanished", iter + 1);
            return CgSolution {
                x,
                iterations: iter + 1,
                residual: rel_residual,
                converged: false,
                residual_history,
            };
        }

        let beta = rho_new * rho.inv();
        rho = rho_new;

        // p = z + beta * p
        p = &z + &p.mapv(|pi| pi * beta);
    }

    let rel_residual = vector_norm(&r) / b_norm;
    CgSolution {
        x,
        iterations: config.max_iterations,
        residual: rel_residual,
        converged: false,
        residual_history,
    }
}

#[inline]
fn inner_product<T: ComplexField>(x: &Array1<T>, y: &Array1<T>) -> T {
    x.iter()
        .zip(y.iter())
        .fold(T::zero(), |acc, (&xi, &yi)| acc + xi.conj() * yi)
}

#[inline]
fn vector_norm<T: ComplexField>(x: &Array1<T>) -> T::Real {
    x.iter()
        .map(|xi| xi.norm_sqr())
        .fold(T::Real::zero(), |acc, v| acc + v)
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparse::CsrMatrix;
    use crate::sparse::gallery::poisson_2d;
    use ndarray::array;

    #[test]
    fn test_cg_spd() {
        let dense = array![[4.0_f64, 1.0], [1.0, 3.0]];
        let a = CsrMatrix::from_dense(&dense, 1e-15);
        let b = array![1.0_f64, 2.0];

        let config = CgConfig {
            max_iterations: 100,
            tolerance: 1e-10,
            print_interval: 0,
        };

        let solution = cg(&a, &b, &config);

        assert!(solution.converged, "CG should converge for SPD matrix");
        let error: f64 = a.residual(&b, &solution.x).iter().map(|e| e * e).sum::<f64>().sqrt();
        assert!(error < 1e-8, "Solution should satisfy Ax = b");
        assert_eq!(solution.residual_history.len(), solution.iterations);
    }

    #[test]
    fn test_cg_identity() {
        let n = 5;
        let id: CsrMatrix<f64> = CsrMatrix::identity(n);
        let b = Array1::from_iter((1..=n).map(|i| i as f64));

        let solution = cg(&id, &b, &CgConfig::default());

        assert!(solution.converged);
        assert!(solution.iterations <= 2);
    }

    #[test]
    fn test_zero_rhs() {
        let a: CsrMatrix<f64> = poisson_2d(4, 4);
        let solution = cg(&a, &Array1::zeros(16), &CgConfig::default());
        assert!(solution.converged);
        assert_eq!(solution.iterations, 0);
    }

    #[test]
    fn test_tiny_scale_system() {
        let a: CsrMatrix<f64> = poisson_2d(8, 8);
        let b = Array1::from_elem(64, 1.0);
        let reference = cg(&a, &b, &CgConfig::default());

        let mut tiny = a.clone();
        tiny.scale(1e-20);
        let solution = cg(&tiny, &b.mapv(|v| v * 1e-20), &CgConfig::default());

        assert!(solution.converged);
        assert!(solution.iterations.abs_diff(reference.iterations) <= 1);
        for (x, y) in solution.x.iter().zip(reference.x.iter()) {
            assert!((x - y).abs() < 1e-8 * y.abs().max(1.0));
        }
    }

    #[test]
    fn test_iteration_limit() {
        let a: CsrMatrix<f64> = poisson_2d(16, 16);
        let b = Array1::from_elem(256, 1.0);
        let config = CgConfig {
            max_iterations: 3,
            tolerance: 1e-14,
            print_interval: 1,
        };

        let solution = cg(&a, &b, &config);
        assert!(!solution.converged);
        assert_eq!(solution.iterations, 3);
    }
}
