//! LU decomposition solver
//!
//! Dense LU factorization with partial pivoting. Multigrid only ever hands
//! small systems to it: the coarsest Galerkin operator and the line blocks
//! of a TFF decomposition.

use crate::error::{AmgError, Result};
use crate::sparse::CsrMatrix;
use crate::traits::ComplexField;
use ndarray::{Array1, Array2};

/// Pivots smaller than this, relative to the largest entry, are treated as zero
const PIVOT_TOLERANCE: f64 = 1e-15;

/// LU factorization result
///
/// L (unit lower triangular) and U share one array; `swaps[k]` is the row
/// exchanged with row `k` during elimination step `k`.
#[derive(Debug, Clone)]
pub struct LuFactorization<T: ComplexField> {
    /// Combined L and U factors
    pub lu: Array2<T>,
    /// Row interchanges in elimination order
    pub swaps: Vec<usize>,
    /// Matrix dimension
    pub n: usize,
}

impl<T: ComplexField> LuFactorization<T> {
    /// Factorize a sparse matrix through its dense copy
    pub fn from_csr(matrix: &CsrMatrix<T>) -> Result<Self> {
        if !matrix.is_square() {
            return Err(AmgError::NotSquare {
                rows: matrix.num_rows,
                cols: matrix.num_cols,
            });
        }
        lu_factorize(&matrix.to_dense())
    }

    /// Solve Ax = b using the pre-computed factorization
    pub fn solve(&self, b: &Array1<T>) -> Result<Array1<T>> {
        if b.len() != self.n {
            return Err(AmgError::DimensionMismatch {
                expected: self.n,
                got: b.len(),
            });
        }

        let mut x = b.clone();

        for (k, &p) in self.swaps.iter().enumerate() {
            if p != k {
                x.swap(k, p);
            }
        }

        // Forward substitution: Ly = Pb
        for i in 0..self.n {
            let mut sum = x[i];
            for j in 0..i {
                sum -= self.lu[[i, j]] * x[j];
            }
            x[i] = sum;
        }

        // Backward substitution: Ux = y
        for i in (0..self.n).rev() {
            let mut sum = x[i];
            for j in (i + 1)..self.n {
                sum -= self.lu[[i, j]] * x[j];
            }
            x[i] = sum * self.lu[[i, i]].inv();
        }

        Ok(x)
    }
}

/// Compute LU factorization with partial pivoting
pub fn lu_factorize<T: ComplexField>(a: &Array2<T>) -> Result<LuFactorization<T>> {
    let n = a.nrows();
    if n != a.ncols() {
        return Err(AmgError::NotSquare {
            rows: n,
            cols: a.ncols(),
        });
    }

    let max_abs = a
        .iter()
        .map(|v| v.norm())
        .fold(T::real_from_f64(0.0), |m, v| if v > m { v } else { m });
    let tol = T::real_from_f64(PIVOT_TOLERANCE) * max_abs;
    let mut lu = a.clone();
    let mut swaps = Vec::with_capacity(n);

    for k in 0..n {
        let (max_row, max_val) = (k..n)
            .map(|i| (i, lu[[i, k]].norm()))
            .fold((k, lu[[k, k]].norm()), |best, cur| {
                if cur.1 > best.1 { cur } else { best }
            });

        if max_val <= tol {
            return Err(AmgError::SingularMatrix);
        }

        if max_row != k {
            for j in 0..n {
                lu.swap([k, j], [max_row, j]);
            }
        }
        swaps.push(max_row);

        let pivot_inv = lu[[k, k]].inv();
        for i in (k + 1)..n {
            let mult = lu[[i, k]] * pivot_inv;
            lu[[i, k]] = mult;
            if mult.is_zero() {
                continue;
            }
            for j in (k + 1)..n {
                let update = mult * lu[[k, j]];
                lu[[i, j]] -= update;
            }
        }
    }

    Ok(LuFactorization { lu, swaps, n })
}

/// Solve Ax = b using LU decomposition
pub fn lu_solve<T: ComplexField>(a: &Array2<T>, b: &Array1<T>) -> Result<Array1<T>> {
    lu_factorize(a)?.solve(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparse::gallery::poisson_2d;
    use approx::assert_relative_eq;
    use ndarray::array;
    use num_complex::Complex64;

    #[test]
    fn test_lu_solve_real() {
        let a = array![[4.0_f64, 1.0], [1.0, 3.0]];
        let b = array![1.0_f64, 2.0];

        let x = lu_solve(&a, &b).expect("LU solve should succeed");

        let ax = a.dot(&x);
        for i in 0..2 {
            assert_relative_eq!(ax[i], b[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_lu_solve_complex() {
        let a = array![
            [Complex64::new(4.0, 1.0), Complex64::new(1.0, 0.0)],
            [Complex64::new(1.0, 0.0), Complex64::new(3.0, -1.0)],
        ];
        let b = array![Complex64::new(1.0, 1.0), Complex64::new(2.0, -1.0)];

        let x = lu_solve(&a, &b).expect("LU solve should succeed");

        let ax = a.dot(&x);
        for i in 0..2 {
            assert_relative_eq!((ax[i] - b[i]).norm(), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_lu_needs_pivoting() {
        // zero leading entry and a chain of row exchanges
        let a = array![[0.0_f64, 2.0, 1.0], [1.0, 0.0, 0.0], [3.0, 1.0, 0.0]];
        let b = array![3.0_f64, 1.0, 4.0];

        let x = lu_solve(&a, &b).expect("LU solve should succeed");

        for (xi, expected) in x.iter().zip([1.0, 1.0, 1.0]) {
            assert_relative_eq!(*xi, expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_lu_singular() {
        let a = array![[1.0_f64, 2.0], [2.0, 4.0]];
        let b = array![1.0_f64, 2.0];

        let result = lu_solve(&a, &b);
        assert!(matches!(result, Err(AmgError::SingularMatrix)));
    }

    #[test]
    fn test_lu_is_scale_invariant() {
        let a: CsrMatrix<f64> = poisson_2d(3, 3);
        let b = Array1::from_iter((0..9).map(|i| (i as f64).cos()));
        let x = LuFactorization::from_csr(&a).unwrap().solve(&b).unwrap();

        let mut scaled = a.clone();
        scaled.scale(1e-40);
        let tiny = LuFactorization::from_csr(&scaled).unwrap();
        let y = tiny.solve(&b.mapv(|v| v * 1e-40)).unwrap();
        for i in 0..9 {
            assert_relative_eq!(y[i], x[i], epsilon = 1e-10);
        }

        assert!(matches!(
            lu_factorize(&Array2::<f64>::zeros((2, 2))),
            Err(AmgError::SingularMatrix)
        ));
    }

    #[test]
    fn test_lu_not_square() {
        let a = Array2::<f64>::zeros((2, 3));
        assert!(lu_factorize(&a).unwrap_err().is_dimension_error());
    }

    #[test]
    fn test_lu_from_csr_multiple_rhs() {
        let a: CsrMatrix<f64> = poisson_2d(4, 3);
        let factorization = LuFactorization::from_csr(&a).expect("factorization should succeed");

        for seed in 0..3 {
            let b = Array1::from_iter((0..12).map(|i| ((i + seed) as f64).sin()));
            let x = factorization.solve(&b).expect("solve should succeed");
            let r = a.residual(&b, &x);
            assert!(r.iter().all(|ri| ri.abs() < 1e-12));
        }

        assert!(factorization.solve(&Array1::zeros(5)).is_err());
    }
}
