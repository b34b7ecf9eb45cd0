//! Recursive TFF block factorization
//!
//! The matrix is viewed as block tridiagonal over the children of a
//! [`BlockVector`] node. The exact Schur complements of block LU are
//! replaced by
//!
//! ```text
//! D_0 = A_00
//! D_i = A_ii - Θ_i,   Θ_i = diag(w ⊘ t),   w = A_{i,i-1} D_{i-1}^{-1} A_{i-1,i} t
//! ```
//!
//! so that `D_i t` equals the true Schur complement applied to the test
//! vector `t`. Line blocks are inverted by dense LU, plane blocks by a
//! decomposition of their own.

use super::TffConfig;
use super::block::BlockVector;
use crate::direct::LuFactorization;
use crate::error::{AmgError, Result};
use crate::sparse::CsrMatrix;
use crate::traits::{ComplexField, Preconditioner};
use ndarray::{Array1, s};
use num_traits::ToPrimitive;
use std::ops::Range;

/// Inverse of one diagonal block
#[derive(Debug, Clone)]
enum BlockSolver<T: ComplexField> {
    Dense(LuFactorization<T>),
    Recursive(Box<TffDecomposition<T>>),
}

impl<T: ComplexField> BlockSolver<T> {
    fn new(block: &CsrMatrix<T>, node: &BlockVector, config: &TffConfig) -> Result<Self> {
        if node.is_line() {
            Ok(BlockSolver::Dense(LuFactorization::from_csr(block)?))
        } else {
            Ok(BlockSolver::Recursive(Box::new(TffDecomposition::new(
                block, node, config,
            )?)))
        }
    }

    fn solve(&self, b: &Array1<T>) -> Result<Array1<T>> {
        match self {
            BlockSolver::Dense(lu) => lu.solve(b),
            BlockSolver::Recursive(tff) => tff.solve(b),
        }
    }
}

/// Tangential frequency filtering decomposition of one tree node
#[derive(Debug, Clone)]
pub struct TffDecomposition<T: ComplexField> {
    n: usize,
    /// Local index range of every block
    blocks: Vec<Range<usize>>,
    /// `A_{i,i-1}`, absent for the first block
    lower: Vec<Option<CsrMatrix<T>>>,
    /// `A_{i,i+1}`, absent for the last block
    upper: Vec<Option<CsrMatrix<T>>>,
    solvers: Vec<BlockSolver<T>>,
    thetas: Vec<Array1<T>>,
}

impl<T: ComplexField> TffDecomposition<T> {
    /// Factorize `matrix` over the children of `node`
    ///
    /// `matrix` is indexed locally, i.e. its row 0 is `node.offset()`.
    pub fn new(matrix: &CsrMatrix<T>, node: &BlockVector, config: &TffConfig) -> Result<Self> {
        config.validate()?;
        let n = node.len();
        if !matrix.is_square() {
            return Err(AmgError::NotSquare {
                rows: matrix.num_rows,
                cols: matrix.num_cols,
            });
        }
        if matrix.num_rows != n {
            return Err(AmgError::DimensionMismatch {
                expected: n,
                got: matrix.num_rows,
            });
        }

        if node.is_line() {
            return Ok(Self {
                n,
                blocks: vec![0..n],
                lower: vec![None],
                upper: vec![None],
                solvers: vec![BlockSolver::new(matrix, node, config)?],
                thetas: vec![Array1::zeros(n)],
            });
        }

        let base = node.offset();
        let blocks: Vec<Range<usize>> = node
            .children()
            .iter()
            .map(|c| c.offset() - base..c.offset() - base + c.len())
            .collect();
        let m = blocks.len();

        let lower: Vec<Option<CsrMatrix<T>>> = (0..m)
            .map(|i| (i > 0).then(|| matrix.submatrix(blocks[i].clone(), blocks[i - 1].clone())))
            .collect();
        let upper: Vec<Option<CsrMatrix<T>>> = (0..m)
            .map(|i| {
                (i + 1 < m).then(|| matrix.submatrix(blocks[i].clone(), blocks[i + 1].clone()))
            })
            .collect();

        let tol = config.zero_tolerance;
        let mut solvers: Vec<BlockSolver<T>> = Vec::with_capacity(m);
        let mut thetas = Vec::with_capacity(m);
        let mut zero_entries = 0;

        for (i, child) in node.children().iter().enumerate() {
            let a_ii = matrix.submatrix(blocks[i].clone(), blocks[i].clone());
            let theta = match (&lower[i], i.checked_sub(1)) {
                (Some(a_lower), Some(prev)) => {
                    let t: Array1<T> = config.test_vector.evaluate(child.dims());
                    let a_upper = upper[prev].as_ref().ok_or(AmgError::DimensionMismatch {
                        expected: m,
                        got: prev,
                    })?;
                    let v = solvers[prev].solve(&a_upper.matvec(&t))?;
                    let w = a_lower.matvec(&v);
                    Array1::from_shape_fn(t.len(), |j| {
                        if t[j].norm().to_f64().unwrap_or(0.0) < tol {
                            zero_entries += 1;
                            T::zero()
                        } else {
                            w[j] * t[j].inv()
                        }
                    })
                }
                _ => Array1::zeros(a_ii.num_rows),
            };

            let d_i = a_ii.with_diagonal_shift(&theta.mapv(|v| -v));
            solvers.push(BlockSolver::new(&d_i, child, config)?);
            thetas.push(theta);
        }

        if zero_entries > 0 {
            log::warn!(
                "TFF: {zero_entries} test vector entries below {tol:e}, filtering dropped there"
            );
        }
        log::debug!(
            "TFF: {} blocks of dimension {} factorized ({} unknowns)",
            m,
            node.dims().len() - 1,
            n
        );

        Ok(Self {
            n,
            blocks,
            lower,
            upper,
            solvers,
            thetas,
        })
    }

    /// Number of unknowns
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Number of diagonal blocks on this level
    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Diagonal of `Θ_i` (zero for the first block)
    pub fn theta(&self, i: usize) -> &Array1<T> {
        &self.thetas[i]
    }

    /// Forward and backward block substitution
    pub fn solve(&self, b: &Array1<T>) -> Result<Array1<T>> {
        if b.len() != self.n {
            return Err(AmgError::DimensionMismatch {
                expected: self.n,
                got: b.len(),
            });
        }

        let m = self.blocks.len();
        let mut y: Vec<Array1<T>> = Vec::with_capacity(m);
        for i in 0..m {
            let mut rhs = b.slice(s![self.blocks[i].clone()]).to_owned();
            if let Some(a_lower) = &self.lower[i] {
                rhs -= &a_lower.matvec(&y[i - 1]);
            }
            y.push(self.solvers[i].solve(&rhs)?);
        }

        for i in (0..m.saturating_sub(1)).rev() {
            if let Some(a_upper) = &self.upper[i] {
                let next = y[i + 1].clone();
                let correction = self.solvers[i].solve(&a_upper.matvec(&next))?;
                y[i] -= &correction;
            }
        }

        let mut x = Array1::zeros(self.n);
        for (range, yi) in self.blocks.iter().zip(y) {
            x.slice_mut(s![range.clone()]).assign(&yi);
        }
        Ok(x)
    }
}

/// TFF preconditioner over a tensor grid
#[derive(Debug, Clone)]
pub struct TffPreconditioner<T: ComplexField> {
    tree: BlockVector,
    decomposition: TffDecomposition<T>,
}

impl<T: ComplexField> TffPreconditioner<T> {
    /// Build the block tree for `dims` and factorize `matrix` over it
    pub fn new(matrix: &CsrMatrix<T>, dims: &[usize], config: &TffConfig) -> Result<Self> {
        let start = std::time::Instant::now();
        let tree = BlockVector::from_dims(dims)?;
        let decomposition = TffDecomposition::new(matrix, &tree, config)?;
        log::info!(
            "TFF setup: {} unknowns, {} lines, {:.2} ms",
            tree.len(),
            tree.num_lines(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(Self {
            tree,
            decomposition,
        })
    }

    pub fn tree(&self) -> &BlockVector {
        &self.tree
    }

    pub fn decomposition(&self) -> &TffDecomposition<T> {
        &self.decomposition
    }
}

impl<T: ComplexField> Preconditioner<T> for TffPreconditioner<T> {
    fn apply(&self, r: &Array1<T>) -> Array1<T> {
        match self.decomposition.solve(r) {
            Ok(z) => z,
            Err(e) => {
                log::warn!("TFF solve failed ({e}), returning residual unchanged");
                r.clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparse::gallery::{anisotropic_2d, poisson_1d, poisson_2d, poisson_3d};
    use crate::tff::TestVector;
    use approx::assert_relative_eq;
    use num_complex::Complex64;

    /// x with every line block a multiple of the line test vector
    fn filtered_vector(config: &TffConfig, nx: usize, ny: usize) -> Array1<f64> {
        let t: Array1<f64> = config.test_vector.evaluate(&[nx]);
        Array1::from_shape_fn(nx * ny, |idx| (1.0 + (idx / nx) as f64) * t[idx % nx])
    }

    #[test]
    fn test_line_is_exact() {
        let a: CsrMatrix<f64> = poisson_1d(9);
        let tree = BlockVector::from_dims(&[9]).unwrap();
        let tff = TffDecomposition::new(&a, &tree, &TffConfig::default()).unwrap();
        assert_eq!(tff.num_blocks(), 1);

        let x = Array1::from_shape_fn(9, |i| (i as f64).cos());
        let y = tff.solve(&a.matvec(&x)).unwrap();
        for i in 0..9 {
            assert_relative_eq!(y[i], x[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_filtering_property_2d() {
        for config in [
            TffConfig::default(),
            TffConfig {
                test_vector: TestVector::Constant,
                ..Default::default()
            },
        ] {
            for a in [poisson_2d(7, 5), anisotropic_2d(7, 5, 0.1)] {
                let tree = BlockVector::from_dims(&[7, 5]).unwrap();
                let tff = TffDecomposition::new(&a, &tree, &config).unwrap();

                let x = filtered_vector(&config, 7, 5);
                let y = tff.solve(&a.matvec(&x)).unwrap();
                for i in 0..35 {
                    assert_relative_eq!(y[i], x[i], epsilon = 1e-10);
                }
            }
        }
    }

    #[test]
    fn test_theta_matches_schur_complement_on_test_vector() {
        let a: CsrMatrix<f64> = poisson_2d(6, 4);
        let tree = BlockVector::from_dims(&[6, 4]).unwrap();
        let config = TffConfig::default();
        let tff = TffDecomposition::new(&a, &tree, &config).unwrap();

        assert_eq!(tff.num_blocks(), 4);
        assert!(tff.theta(0).iter().all(|&v| v == 0.0));
        // the Schur complement correction is positive for the Laplacian
        assert!(tff.theta(1).iter().all(|&v| v > 0.0));
        // D_1 t = A_11 t - A_10 A_00^{-1} A_01 t
        let t: Array1<f64> = config.test_vector.evaluate(&[6]);
        let a00 = a.submatrix(0..6, 0..6);
        let a01 = a.submatrix(0..6, 6..12);
        let a10 = a.submatrix(6..12, 0..6);
        let lu = LuFactorization::from_csr(&a00).unwrap();
        let w = a10.matvec(&lu.solve(&a01.matvec(&t)).unwrap());
        for j in 0..6 {
            assert_relative_eq!(tff.theta(1)[j] * t[j], w[j], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_zero_test_vector_entries() {
        let a: CsrMatrix<f64> = poisson_2d(5, 3);
        let tree = BlockVector::from_dims(&[5, 3]).unwrap();
        let config = TffConfig {
            test_vector: TestVector::Sine { frequency: 2.0 },
            ..Default::default()
        };
        let tff = TffDecomposition::new(&a, &tree, &config).unwrap();
        assert_eq!(tff.theta(1)[2], 0.0);
        assert_eq!(tff.theta(2)[2], 0.0);
    }

    #[test]
    fn test_3d_recursion() {
        let a: CsrMatrix<f64> = poisson_3d(4, 4, 4);
        let tff = TffPreconditioner::new(&a, &[4, 4, 4], &TffConfig::default()).unwrap();
        assert_eq!(tff.tree().num_lines(), 16);
        assert_eq!(tff.decomposition().num_blocks(), 4);

        // approximate inverse: one application leaves a small residual
        let b = Array1::from_elem(64, 1.0);
        let z = tff.apply(&b);
        let r = a.residual(&b, &z);
        let rel = r.mapv(|v| v * v).sum().sqrt() / b.mapv(|v| v * v).sum().sqrt();
        assert!(rel < 0.5, "relative residual {rel}");
    }

    #[test]
    fn test_complex_matrix() {
        let a: CsrMatrix<Complex64> = poisson_2d(4, 3);
        let shifted = a.with_diagonal_shift(&Array1::from_elem(12, Complex64::new(0.0, 0.3)));
        let tff = TffPreconditioner::new(&shifted, &[4, 3], &TffConfig::default()).unwrap();

        let t: Array1<Complex64> = TffConfig::default().test_vector.evaluate(&[4]);
        let x = Array1::from_shape_fn(12, |idx| t[idx % 4] * Complex64::new(1.0, (idx / 4) as f64));
        let y = tff.apply(&shifted.matvec(&x));
        for i in 0..12 {
            assert!((y[i] - x[i]).norm() < 1e-10);
        }
    }

    #[test]
    fn test_dimension_mismatch() {
        let a: CsrMatrix<f64> = poisson_2d(4, 4);
        let err = TffPreconditioner::new(&a, &[4, 5], &TffConfig::default()).unwrap_err();
        assert!(err.is_dimension_error());

        let tff = TffPreconditioner::new(&a, &[4, 4], &TffConfig::default()).unwrap();
        assert!(tff.decomposition().solve(&Array1::zeros(3)).is_err());
        let r = Array1::from_elem(3, 1.0);
        assert_eq!(tff.apply(&r), r);
    }
}
