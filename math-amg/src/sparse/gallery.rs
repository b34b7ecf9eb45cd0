//! Model problems for testing and benchmarking
//!
//! Finite-difference Laplacians on tensor grids with Dirichlet boundary
//! values eliminated. Unknowns are numbered lexicographically with x
//! running fastest, which is the ordering the TFF block tree expects.

use super::CsrMatrix;
use crate::traits::ComplexField;

/// 1D Laplacian tridiag(-1, 2, -1)
pub fn poisson_1d<T: ComplexField>(n: usize) -> CsrMatrix<T> {
    stencil_matrix(&[n], &[1.0])
}

/// 2D five-point Laplacian on an `nx × ny` grid
pub fn poisson_2d<T: ComplexField>(nx: usize, ny: usize) -> CsrMatrix<T> {
    stencil_matrix(&[nx, ny], &[1.0, 1.0])
}

/// 3D seven-point Laplacian on an `nx × ny × nz` grid
pub fn poisson_3d<T: ComplexField>(nx: usize, ny: usize, nz: usize) -> CsrMatrix<T> {
    stencil_matrix(&[nx, ny, nz], &[1.0, 1.0, 1.0])
}

/// Anisotropic 2D operator `-u_xx - ε u_yy`
///
/// For small `ε` the strong couplings run along x-lines only, which is the
/// classic test for strength-of-connection and line-based smoothers.
pub fn anisotropic_2d<T: ComplexField>(nx: usize, ny: usize, epsilon: f64) -> CsrMatrix<T> {
    stencil_matrix(&[nx, ny], &[1.0, epsilon])
}

/// Assemble a star stencil with per-direction coupling `coeffs[d]`
fn stencil_matrix<T: ComplexField>(dims: &[usize], coeffs: &[f64]) -> CsrMatrix<T> {
    debug_assert_eq!(dims.len(), coeffs.len());

    let n: usize = dims.iter().product();
    let diag: f64 = 2.0 * coeffs.iter().sum::<f64>();

    let mut strides = Vec::with_capacity(dims.len());
    let mut stride = 1;
    for &d in dims {
        strides.push(stride);
        stride *= d;
    }

    let mut triplets = Vec::with_capacity(n * (2 * dims.len() + 1));
    for idx in 0..n {
        triplets.push((idx, idx, T::from_f64(diag)));
        for (d, (&size, &step)) in dims.iter().zip(&strides).enumerate() {
            let coord = (idx / step) % size;
            let off = T::from_f64(-coeffs[d]);
            if coord > 0 {
                triplets.push((idx, idx - step, off));
            }
            if coord + 1 < size {
                triplets.push((idx, idx + step, off));
            }
        }
    }

    CsrMatrix::from_triplets(n, n, triplets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_poisson_1d() {
        let a: CsrMatrix<f64> = poisson_1d(5);
        assert_eq!(a.nnz(), 13);
        assert_relative_eq!(a.get(0, 0), 2.0);
        assert_relative_eq!(a.get(2, 1), -1.0);
        assert_relative_eq!(a.get(4, 3), -1.0);
    }

    #[test]
    fn test_poisson_2d_structure() {
        let a: CsrMatrix<f64> = poisson_2d(3, 4);
        assert_eq!(a.num_rows, 12);
        // interior point (1, 1) -> index 4
        assert_eq!(a.row_len(4), 5);
        assert_relative_eq!(a.get(4, 4), 4.0);
        assert_relative_eq!(a.get(4, 1), -1.0);
        assert_relative_eq!(a.get(4, 7), -1.0);
        // no wrap-around between x-lines
        assert_relative_eq!(a.get(2, 3), 0.0);
    }

    #[test]
    fn test_poisson_3d_symmetric() {
        let a: CsrMatrix<f64> = poisson_3d(3, 3, 3);
        assert_eq!(a.num_rows, 27);
        assert_relative_eq!(a.get(13, 13), 6.0);
        assert_eq!(a.row_len(13), 7);
        let t = a.transpose();
        assert_eq!(t.col_indices, a.col_indices);
    }

    #[test]
    fn test_anisotropic_2d() {
        let a: CsrMatrix<f64> = anisotropic_2d(4, 4, 0.01);
        assert_relative_eq!(a.get(5, 5), 2.02, epsilon = 1e-12);
        assert_relative_eq!(a.get(5, 6), -1.0);
        assert_relative_eq!(a.get(5, 9), -0.01);
    }
}
