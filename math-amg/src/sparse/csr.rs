//! Compressed Sparse Row (CSR) matrix format
//!
//! CSR format stores:
//! - `values`: Non-zero entries in row-major order
//! - `col_indices`: Column index for each value
//! - `row_ptrs`: Index into values/col_indices where each row starts
//!
//! Every level of a multigrid hierarchy (system matrix, prolongation,
//! restriction) is stored in this format. Rows are kept sorted by column.

use crate::parallel::parallel_map_indexed;
use crate::traits::{ComplexField, LinearOperator};
use ndarray::{Array1, Array2};
use num_traits::Zero;
use std::ops::Range;

/// Rows below which mat-vecs stay sequential
const PARALLEL_MATVEC_ROWS: usize = 2048;

/// Product entries smaller than this, relative to the summed magnitude of
/// their terms, are cancellation noise
const CANCELLATION_TOLERANCE: f64 = 1e-15;

/// Compressed Sparse Row (CSR) matrix format
#[derive(Debug, Clone)]
pub struct CsrMatrix<T: ComplexField> {
    /// Number of rows
    pub num_rows: usize,
    /// Number of columns
    pub num_cols: usize,
    /// Non-zero values in row-major order
    pub values: Vec<T>,
    /// Column indices for each value
    pub col_indices: Vec<usize>,
    /// Row pointers: row_ptrs[i] is the start index in values/col_indices for row i
    /// row_ptrs[num_rows] = nnz (total number of non-zeros)
    pub row_ptrs: Vec<usize>,
}

impl<T: ComplexField> CsrMatrix<T> {
    /// Create a new empty CSR matrix
    pub fn new(num_rows: usize, num_cols: usize) -> Self {
        Self {
            num_rows,
            num_cols,
            values: Vec::new(),
            col_indices: Vec::new(),
            row_ptrs: vec![0; num_rows + 1],
        }
    }

    /// Create a CSR matrix from raw components
    ///
    /// # Panics
    ///
    /// Panics if the input arrays are inconsistent:
    /// - `row_ptrs` must have length `num_rows + 1`
    /// - `col_indices` and `values` must have the same length
    /// - `row_ptrs[num_rows]` must equal `values.len()`
    pub fn from_raw_parts(
        num_rows: usize,
        num_cols: usize,
        row_ptrs: Vec<usize>,
        col_indices: Vec<usize>,
        values: Vec<T>,
    ) -> Self {
        assert_eq!(
            row_ptrs.len(),
            num_rows + 1,
            "row_ptrs must have num_rows + 1 elements"
        );
        assert_eq!(
            col_indices.len(),
            values.len(),
            "col_indices and values must have the same length"
        );
        assert_eq!(
            row_ptrs[num_rows],
            values.len(),
            "row_ptrs[num_rows] must equal nnz"
        );

        Self {
            num_rows,
            num_cols,
            row_ptrs,
            col_indices,
            values,
        }
    }

    /// Create a CSR matrix from a dense matrix
    ///
    /// Only stores entries with magnitude > threshold
    pub fn from_dense(dense: &Array2<T>, threshold: T::Real) -> Self {
        let mut builder = CsrBuilder::new(dense.nrows(), dense.ncols());
        for row in dense.rows() {
            builder.add_row_entries(
                row.iter()
                    .copied()
                    .enumerate()
                    .filter(|(_, val)| val.norm() > threshold),
            );
        }
        builder.finish()
    }

    /// Create a CSR matrix from COO (Coordinate) format triplets
    ///
    /// Triplets are (row, col, value). Duplicate entries are summed.
    pub fn from_triplets(
        num_rows: usize,
        num_cols: usize,
        mut triplets: Vec<(usize, usize, T)>,
    ) -> Self {
        triplets.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        let mut values: Vec<T> = Vec::with_capacity(triplets.len());
        let mut col_indices: Vec<usize> = Vec::with_capacity(triplets.len());
        let mut row_counts = vec![0usize; num_rows + 1];
        let mut last: Option<(usize, usize)> = None;

        for (row, col, val) in triplets {
            assert!(
                row < num_rows && col < num_cols,
                "triplet ({row}, {col}) outside {num_rows}x{num_cols}"
            );
            if last == Some((row, col)) {
                if let Some(v) = values.last_mut() {
                    *v += val;
                }
                continue;
            }
            values.push(val);
            col_indices.push(col);
            row_counts[row + 1] += 1;
            last = Some((row, col));
        }

        for i in 0..num_rows {
            row_counts[i + 1] += row_counts[i];
        }

        Self {
            num_rows,
            num_cols,
            values,
            col_indices,
            row_ptrs: row_counts,
        }
    }

    /// Create identity matrix in CSR format
    pub fn identity(n: usize) -> Self {
        Self {
            num_rows: n,
            num_cols: n,
            values: vec![T::one(); n],
            col_indices: (0..n).collect(),
            row_ptrs: (0..=n).collect(),
        }
    }

    /// Create diagonal matrix from vector
    pub fn from_diagonal(diag: &Array1<T>) -> Self {
        let n = diag.len();
        Self {
            num_rows: n,
            num_cols: n,
            values: diag.to_vec(),
            col_indices: (0..n).collect(),
            row_ptrs: (0..=n).collect(),
        }
    }

    /// Number of non-zero entries
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Whether the matrix is square
    pub fn is_square(&self) -> bool {
        self.num_rows == self.num_cols
    }

    /// Get the range of indices in values/col_indices for a given row
    pub fn row_range(&self, row: usize) -> Range<usize> {
        self.row_ptrs[row]..self.row_ptrs[row + 1]
    }

    /// Number of stored entries in a row
    pub fn row_len(&self, row: usize) -> usize {
        self.row_ptrs[row + 1] - self.row_ptrs[row]
    }

    /// Get the (col, value) pairs for a row
    pub fn row_entries(&self, row: usize) -> impl Iterator<Item = (usize, T)> + '_ {
        let range = self.row_range(row);
        self.col_indices[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    /// Get element at (i, j), returns 0 if not stored
    pub fn get(&self, i: usize, j: usize) -> T {
        let range = self.row_range(i);
        match self.col_indices[range.clone()].binary_search(&j) {
            Ok(pos) => self.values[range.start + pos],
            Err(_) => self
                .row_entries(i)
                .find(|&(col, _)| col == j)
                .map_or_else(T::zero, |(_, v)| v),
        }
    }

    /// Extract diagonal elements
    pub fn diagonal(&self) -> Array1<T> {
        let n = self.num_rows.min(self.num_cols);
        Array1::from_iter((0..n).map(|i| self.get(i, i)))
    }

    /// Matrix-vector product: y = A * x
    ///
    /// Large matrices are processed row-parallel.
    pub fn matvec(&self, x: &Array1<T>) -> Array1<T> {
        assert_eq!(x.len(), self.num_cols, "Input vector size mismatch");

        let row_dot = |i: usize| {
            let mut sum = T::zero();
            for idx in self.row_range(i) {
                sum += self.values[idx] * x[self.col_indices[idx]];
            }
            sum
        };

        if self.num_rows >= PARALLEL_MATVEC_ROWS {
            Array1::from_vec(parallel_map_indexed(self.num_rows, row_dot))
        } else {
            Array1::from_iter((0..self.num_rows).map(row_dot))
        }
    }

    /// Residual r = b - A * x
    pub fn residual(&self, b: &Array1<T>, x: &Array1<T>) -> Array1<T> {
        b - &self.matvec(x)
    }

    /// Transpose matrix-vector product: y = A^T * x
    pub fn matvec_transpose(&self, x: &Array1<T>) -> Array1<T> {
        assert_eq!(x.len(), self.num_rows, "Input vector size mismatch");

        let mut y = Array1::from_elem(self.num_cols, T::zero());
        for i in 0..self.num_rows {
            for (j, val) in self.row_entries(i) {
                y[j] += val * x[i];
            }
        }
        y
    }

    /// Hermitian (conjugate transpose) matrix-vector product: y = A^H * x
    pub fn matvec_hermitian(&self, x: &Array1<T>) -> Array1<T> {
        assert_eq!(x.len(), self.num_rows, "Input vector size mismatch");

        let mut y = Array1::from_elem(self.num_cols, T::zero());
        for i in 0..self.num_rows {
            for (j, val) in self.row_entries(i) {
                y[j] += val.conj() * x[i];
            }
        }
        y
    }

    /// Explicit transpose A^T (counting sort over columns, rows stay sorted)
    pub fn transpose(&self) -> CsrMatrix<T> {
        self.transpose_map(|v| v)
    }

    /// Explicit conjugate transpose A^H
    pub fn conjugate_transpose(&self) -> CsrMatrix<T> {
        self.transpose_map(|v| v.conj())
    }

    fn transpose_map(&self, f: impl Fn(T) -> T) -> CsrMatrix<T> {
        let mut row_ptrs = vec![0usize; self.num_cols + 1];
        for &j in &self.col_indices {
            row_ptrs[j + 1] += 1;
        }
        for j in 0..self.num_cols {
            row_ptrs[j + 1] += row_ptrs[j];
        }

        let mut next = row_ptrs.clone();
        let mut col_indices = vec![0usize; self.nnz()];
        let mut values = vec![T::zero(); self.nnz()];
        for i in 0..self.num_rows {
            for (j, val) in self.row_entries(i) {
                let dst = next[j];
                col_indices[dst] = i;
                values[dst] = f(val);
                next[j] += 1;
            }
        }

        CsrMatrix {
            num_rows: self.num_cols,
            num_cols: self.num_rows,
            values,
            col_indices,
            row_ptrs,
        }
    }

    /// Sparse matrix product C = A * B
    ///
    /// Row-by-row accumulation into a dense marker array (Gustavson).
    /// Entries that cancel to roundoff relative to the magnitude of their
    /// terms are dropped, so the pattern does not depend on the scaling.
    pub fn matmul(&self, other: &CsrMatrix<T>) -> CsrMatrix<T> {
        assert_eq!(
            self.num_cols, other.num_rows,
            "Matrix dimension mismatch: A.cols ({}) != B.rows ({})",
            self.num_cols, other.num_rows
        );

        let m = self.num_rows;
        let n = other.num_cols;
        let tol = T::real_from_f64(CANCELLATION_TOLERANCE);

        let mut row_ptrs = Vec::with_capacity(m + 1);
        row_ptrs.push(0);
        let mut col_indices = Vec::with_capacity(self.nnz() + other.nnz());
        let mut values = Vec::with_capacity(self.nnz() + other.nnz());

        let mut marker = vec![usize::MAX; n];
        let mut accum = vec![T::zero(); n];
        let mut terms = vec![T::Real::zero(); n];
        let mut pattern: Vec<usize> = Vec::new();

        for i in 0..m {
            pattern.clear();
            for (k, a_ik) in self.row_entries(i) {
                for (j, b_kj) in other.row_entries(k) {
                    if marker[j] != i {
                        marker[j] = i;
                        accum[j] = T::zero();
                        terms[j] = T::Real::zero();
                        pattern.push(j);
                    }
                    let product = a_ik * b_kj;
                    accum[j] += product;
                    terms[j] += product.norm();
                }
            }
            pattern.sort_unstable();
            for &j in &pattern {
                if accum[j].norm() > tol * terms[j] {
                    col_indices.push(j);
                    values.push(accum[j]);
                }
            }
            row_ptrs.push(values.len());
        }

        CsrMatrix {
            num_rows: m,
            num_cols: n,
            values,
            col_indices,
            row_ptrs,
        }
    }

    /// Extract the block `A[rows, cols]` with local (zero-based) indices
    pub fn submatrix(&self, rows: Range<usize>, cols: Range<usize>) -> CsrMatrix<T> {
        assert!(rows.end <= self.num_rows && cols.end <= self.num_cols);

        let mut builder = CsrBuilder::new(rows.len(), cols.len());
        for i in rows {
            builder.add_row_entries(
                self.row_entries(i)
                    .filter(|(j, _)| cols.contains(j))
                    .map(|(j, v)| (j - cols.start, v)),
            );
        }
        builder.finish()
    }

    /// Return `A + diag(shift)`, inserting diagonal entries where missing
    pub fn with_diagonal_shift(&self, shift: &Array1<T>) -> CsrMatrix<T> {
        assert_eq!(shift.len(), self.num_rows.min(self.num_cols));

        let mut triplets = Vec::with_capacity(self.nnz() + shift.len());
        for i in 0..self.num_rows {
            triplets.extend(self.row_entries(i).map(|(j, v)| (i, j, v)));
        }
        triplets.extend(
            shift
                .iter()
                .enumerate()
                .filter(|(_, s)| !s.is_zero())
                .map(|(i, &s)| (i, i, s)),
        );
        CsrMatrix::from_triplets(self.num_rows, self.num_cols, triplets)
    }

    /// Scale all values by a scalar
    pub fn scale(&mut self, scalar: T) {
        for val in &mut self.values {
            *val *= scalar;
        }
    }

    /// Convert to dense matrix (for debugging/small matrices)
    pub fn to_dense(&self) -> Array2<T> {
        let mut dense = Array2::from_elem((self.num_rows, self.num_cols), T::zero());
        for i in 0..self.num_rows {
            for (j, val) in self.row_entries(i) {
                dense[[i, j]] += val;
            }
        }
        dense
    }
}

impl<T: ComplexField> LinearOperator<T> for CsrMatrix<T> {
    fn num_rows(&self) -> usize {
        self.num_rows
    }

    fn num_cols(&self) -> usize {
        self.num_cols
    }

    fn apply(&self, x: &Array1<T>) -> Array1<T> {
        self.matvec(x)
    }

    fn apply_transpose(&self, x: &Array1<T>) -> Array1<T> {
        self.matvec_transpose(x)
    }

    fn apply_hermitian(&self, x: &Array1<T>) -> Array1<T> {
        self.matvec_hermitian(x)
    }
}

/// Builder for constructing CSR matrices row by row
pub struct CsrBuilder<T: ComplexField> {
    num_rows: usize,
    num_cols: usize,
    values: Vec<T>,
    col_indices: Vec<usize>,
    row_ptrs: Vec<usize>,
}

impl<T: ComplexField> CsrBuilder<T> {
    /// Create a new CSR builder
    pub fn new(num_rows: usize, num_cols: usize) -> Self {
        let mut row_ptrs = Vec::with_capacity(num_rows + 1);
        row_ptrs.push(0);
        Self {
            num_rows,
            num_cols,
            values: Vec::new(),
            col_indices: Vec::new(),
            row_ptrs,
        }
    }

    /// Number of rows added so far
    pub fn current_row(&self) -> usize {
        self.row_ptrs.len() - 1
    }

    /// Add entries for the next row (must be added in column order).
    /// Exact zeros are skipped.
    pub fn add_row_entries(&mut self, entries: impl Iterator<Item = (usize, T)>) {
        assert!(self.current_row() < self.num_rows, "too many rows added");
        for (col, val) in entries {
            debug_assert!(col < self.num_cols);
            if val.norm() > T::Real::zero() {
                self.values.push(val);
                self.col_indices.push(col);
            }
        }
        self.row_ptrs.push(self.values.len());
    }

    /// Finish building and return the CSR matrix; missing rows stay empty
    pub fn finish(mut self) -> CsrMatrix<T> {
        while self.current_row() < self.num_rows {
            self.row_ptrs.push(self.values.len());
        }

        CsrMatrix {
            num_rows: self.num_rows,
            num_cols: self.num_cols,
            values: self.values,
            col_indices: self.col_indices,
            row_ptrs: self.row_ptrs,
        }
    }
}
