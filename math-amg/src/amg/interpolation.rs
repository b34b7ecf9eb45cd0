//! Interpolation and restriction operators
//!
//! Builds the prolongation `P` (`n_f × n_c`) from a splitting and its
//! coarse grid. Coarse points always get an identity row. Fine points get
//! weights from one of three schemes:
//!
//! - **Average**: `1/|C_i|` for every strong coarse dependency.
//! - **Ruge–Stüben**: classical direct interpolation with strong fine
//!   neighbours distributed over the common coarse points and weak
//!   couplings lumped to the diagonal:
//!   `w_ij = -(a_ij + Σ_{k∈F_i^s} a_ik a_kj / Σ_{m∈C_i} a_km) / (a_ii + Σ_{n∈W_i} a_in)`.
//! - **Vanek**: smoothed aggregation, `P = (I - ω D_F^{-1} A^F) P_tent`.
//!
//! Restriction is the conjugate transpose of `P`, and the coarse operator
//! is the Galerkin product `R A P`.

use super::coarsen::Splitting;
use super::grid::CoarseGrid;
use super::nodes::PointState;
use super::strength::StrengthGraph;
use crate::error::{AmgError, Result};
use crate::parallel::parallel_map_indexed;
use crate::sparse::{CsrBuilder, CsrMatrix};
use crate::traits::ComplexField;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Relative size below which a sum counts as cancelled to zero
const BREAKDOWN_TOLERANCE: f64 = 1e-14;

#[inline]
fn magnitude<T: ComplexField>(v: &T) -> f64 {
    v.norm().to_f64().unwrap_or(0.0)
}

/// Interpolation scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    /// Equal weights over the strong coarse dependencies
    Average,

    /// Classical Ruge–Stüben interpolation
    #[default]
    RugeStuben,

    /// Smoothed aggregation
    Vanek,
}

/// Weight post-processing and smoothing options
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpolationOptions {
    /// Drop weights below `trunc_factor * max|w|` (0 disables)
    pub trunc_factor: f64,

    /// Keep at most this many weights per row (0 = unlimited)
    pub max_elements: usize,

    /// Prolongator smoothing damping; `None` uses `4 / (3 ρ)`
    pub vanek_damping: Option<f64>,
}

impl Default for InterpolationOptions {
    fn default() -> Self {
        Self {
            trunc_factor: 0.0,
            max_elements: 0,
            vanek_damping: None,
        }
    }
}

impl InterpolationOptions {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.trunc_factor) {
            return Err(AmgError::InvalidParameter {
                name: "trunc_factor",
                value: self.trunc_factor,
                reason: "must lie in [0, 1)",
            });
        }
        if let Some(omega) = self.vanek_damping {
            if !(omega.is_finite() && omega > 0.0) {
                return Err(AmgError::InvalidParameter {
                    name: "vanek_damping",
                    value: omega,
                    reason: "must be finite and positive",
                });
            }
        }
        Ok(())
    }

    fn truncates(&self) -> bool {
        self.trunc_factor > 0.0 || self.max_elements > 0
    }
}

/// Build the prolongation for a coarsened level
pub fn interpolate<T: ComplexField>(
    matrix: &CsrMatrix<T>,
    strength: &StrengthGraph,
    splitting: &Splitting,
    grid: &CoarseGrid,
    method: Interpolation,
    options: &InterpolationOptions,
) -> Result<CsrMatrix<T>> {
    options.validate()?;
    if matrix.num_rows != splitting.len() || grid.num_fine() != splitting.len() {
        return Err(AmgError::DimensionMismatch {
            expected: matrix.num_rows,
            got: splitting.len(),
        });
    }

    let p = match method {
        Interpolation::Average => average_interpolation(strength, splitting, grid),
        Interpolation::RugeStuben => {
            ruge_stuben_interpolation(matrix, strength, splitting, grid, options)
        }
        Interpolation::Vanek => vanek_interpolation(matrix, strength, grid, options)?,
    };

    log::debug!(
        "{:?} interpolation: {}x{}, {} weights",
        method,
        p.num_rows,
        p.num_cols,
        p.nnz()
    );
    Ok(p)
}

/// Equal weights `1/|C_i|` over the strong coarse dependencies
pub fn average_interpolation<T: ComplexField>(
    strength: &StrengthGraph,
    splitting: &Splitting,
    grid: &CoarseGrid,
) -> CsrMatrix<T> {
    let rows = parallel_map_indexed(splitting.len(), |i| {
        if let Some(c) = grid.fine_to_coarse(i) {
            return vec![(c, T::one())];
        }
        let coarse: Vec<usize> = strength
            .dependencies(i)
            .iter()
            .filter_map(|&j| grid.fine_to_coarse(j))
            .collect();
        if coarse.is_empty() {
            return Vec::new();
        }
        let w = T::from_f64(1.0 / coarse.len() as f64);
        coarse.into_iter().map(|c| (c, w)).collect()
    });
    assemble(rows, grid.num_coarse())
}

/// Classical Ruge–Stüben interpolation
pub fn ruge_stuben_interpolation<T: ComplexField>(
    matrix: &CsrMatrix<T>,
    strength: &StrengthGraph,
    splitting: &Splitting,
    grid: &CoarseGrid,
    options: &InterpolationOptions,
) -> CsrMatrix<T> {
    let rows = parallel_map_indexed(splitting.len(), |i| {
        if let Some(c) = grid.fine_to_coarse(i) {
            return vec![(c, T::one())];
        }

        let deps = strength.dependencies(i);
        let coarse: Vec<usize> = deps
            .iter()
            .copied()
            .filter(|&j| splitting.is_coarse(j))
            .collect();
        if coarse.is_empty() {
            return Vec::new();
        }

        // numerators start at a_ij for j in C_i
        let mut numer: Vec<T> = coarse.iter().map(|&j| matrix.get(i, j)).collect();
        let mut denom = T::zero();
        let mut denom_terms = 0.0;

        for (k, a_ik) in matrix.row_entries(i) {
            if k == i {
                denom_terms += magnitude(&a_ik);
                denom += a_ik;
                continue;
            }
            if deps.binary_search(&k).is_err() {
                // weak coupling
                denom_terms += magnitude(&a_ik);
                denom += a_ik;
                continue;
            }
            if splitting.state(k) != PointState::Fine {
                continue;
            }

            // strong fine neighbour: distribute over C_i
            let a_k: Vec<T> = coarse.iter().map(|&m| matrix.get(k, m)).collect();
            let sum = a_k.iter().fold(T::zero(), |acc, &v| acc + v);
            let sum_terms: f64 = a_k.iter().map(magnitude).sum();
            if magnitude(&sum) <= BREAKDOWN_TOLERANCE * sum_terms {
                // no connection to C_i: lump to the diagonal
                denom_terms += magnitude(&a_ik);
                denom += a_ik;
                continue;
            }
            let scale = a_ik * sum.inv();
            for (n, a_kj) in numer.iter_mut().zip(a_k) {
                *n += scale * a_kj;
            }
        }

        if magnitude(&denom) <= BREAKDOWN_TOLERANCE * denom_terms {
            log::warn!("row {i}: vanishing interpolation denominator, row left empty");
            return Vec::new();
        }
        let denom_inv = denom.inv();

        let mut weights: Vec<(usize, T)> = coarse
            .iter()
            .zip(numer)
            .filter_map(|(&j, n)| grid.fine_to_coarse(j).map(|c| (c, -n * denom_inv)))
            .collect();
        if options.truncates() {
            truncate_row(&mut weights, options);
        }
        weights
    });
    assemble(rows, grid.num_coarse())
}

/// Smoothed aggregation prolongator `(I - ω D_F^{-1} A^F) P_tent`
///
/// `A^F` keeps the diagonal and the couplings of the symmetrised strong
/// neighbourhood; weak couplings are added to the diagonal so that `A^F`
/// has the row sums of `A`.
pub fn vanek_interpolation<T: ComplexField>(
    matrix: &CsrMatrix<T>,
    strength: &StrengthGraph,
    grid: &CoarseGrid,
    options: &InterpolationOptions,
) -> Result<CsrMatrix<T>> {
    let n = matrix.num_rows;
    let p_tent: CsrMatrix<T> = grid.tentative_prolongation();

    let filtered_rows = parallel_map_indexed(n, |i| {
        let mut diag = T::zero();
        let mut row = Vec::with_capacity(matrix.row_len(i));
        let mut row_scale = 0.0_f64;
        for (j, v) in matrix.row_entries(i) {
            row_scale = row_scale.max(magnitude(&v));
            if j == i {
                diag += v;
            } else if strength.is_strong(i, j) || strength.is_strong(j, i) {
                row.push((i, j, v));
            } else {
                diag += v;
            }
        }
        (diag, row, row_scale)
    });

    let mut diag = Vec::with_capacity(n);
    let mut triplets = Vec::with_capacity(matrix.nnz());
    for (i, (d, row, row_scale)) in filtered_rows.into_iter().enumerate() {
        triplets.extend(row);
        triplets.push((i, i, d));
        diag.push((d, row_scale));
    }
    let filtered = CsrMatrix::from_triplets(n, n, triplets);

    let diag_inv: Vec<T> = diag
        .iter()
        .enumerate()
        .map(|(i, &(d, row_scale))| {
            if magnitude(&d) <= BREAKDOWN_TOLERANCE * row_scale {
                log::warn!("row {i}: zero filtered diagonal, prolongator row not smoothed");
                T::zero()
            } else {
                d.inv()
            }
        })
        .collect();

    let omega = match options.vanek_damping {
        Some(omega) => omega,
        None => {
            let rho = gershgorin_bound(&filtered, &diag_inv);
            if rho > 0.0 { 4.0 / (3.0 * rho) } else { 0.0 }
        }
    };
    log::debug!("smoothed aggregation damping ω = {omega:.4}");

    let ap = filtered.matmul(&p_tent);
    let w = T::from_f64(omega);
    let mut triplets = Vec::with_capacity(p_tent.nnz() + ap.nnz());
    for i in 0..n {
        triplets.extend(p_tent.row_entries(i).map(|(c, v)| (i, c, v)));
        let s = w * diag_inv[i];
        if !s.is_zero() {
            triplets.extend(ap.row_entries(i).map(|(c, v)| (i, c, -(s * v))));
        }
    }
    let smoothed = CsrMatrix::from_triplets(n, grid.num_coarse(), triplets);

    if !options.truncates() {
        return Ok(smoothed);
    }
    let rows = parallel_map_indexed(n, |i| {
        let mut row: Vec<(usize, T)> = smoothed.row_entries(i).collect();
        truncate_row(&mut row, options);
        row
    });
    Ok(assemble(rows, grid.num_coarse()))
}

/// Gershgorin bound `max_i Σ_j |d_i^{-1} a_ij|` on the spectral radius of `D^{-1} A`
fn gershgorin_bound<T: ComplexField>(matrix: &CsrMatrix<T>, diag_inv: &[T]) -> f64 {
    (0..matrix.num_rows)
        .map(|i| {
            let scale = magnitude(&diag_inv[i]);
            matrix
                .row_entries(i)
                .map(|(_, v)| magnitude(&v))
                .sum::<f64>()
                * scale
        })
        .fold(0.0, f64::max)
}

/// Drop small weights and cap the row length, keeping the row sum
pub fn truncate_row<T: ComplexField>(row: &mut Vec<(usize, T)>, options: &InterpolationOptions) {
    if row.is_empty() {
        return;
    }
    let sum_before = row.iter().fold(T::zero(), |acc, &(_, w)| acc + w);
    let len_before = row.len();

    if options.trunc_factor > 0.0 {
        let max = row.iter().map(|(_, w)| magnitude(w)).fold(0.0, f64::max);
        let threshold = options.trunc_factor * max;
        row.retain(|(_, w)| magnitude(w) >= threshold);
    }
    if options.max_elements > 0 && row.len() > options.max_elements {
        row.sort_by(|a, b| magnitude(&b.1).total_cmp(&magnitude(&a.1)));
        row.truncate(options.max_elements);
    }

    if row.len() < len_before {
        let sum_after = row.iter().fold(T::zero(), |acc, &(_, w)| acc + w);
        let kept: f64 = row.iter().map(|(_, w)| magnitude(w)).sum();
        if magnitude(&sum_after) > BREAKDOWN_TOLERANCE * kept {
            let scale = sum_before * sum_after.inv();
            for (_, w) in row.iter_mut() {
                *w *= scale;
            }
        }
    }
    row.sort_by_key(|&(c, _)| c);
}

/// Restriction `R = P^H`
pub fn restriction<T: ComplexField>(prolongation: &CsrMatrix<T>) -> CsrMatrix<T> {
    prolongation.conjugate_transpose()
}

/// Galerkin coarse operator `R A P`
pub fn galerkin<T: ComplexField>(
    restriction: &CsrMatrix<T>,
    matrix: &CsrMatrix<T>,
    prolongation: &CsrMatrix<T>,
) -> CsrMatrix<T> {
    let ap = matrix.matmul(prolongation);
    restriction.matmul(&ap)
}

fn assemble<T: ComplexField>(rows: Vec<Vec<(usize, T)>>, num_coarse: usize) -> CsrMatrix<T> {
    let mut builder = CsrBuilder::new(rows.len(), num_coarse);
    for mut row in rows {
        row.sort_by_key(|&(c, _)| c);
        builder.add_row_entries(row.into_iter());
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amg::coarsen::{Coarsening, coarsen};
    use crate::amg::strength::Marking;
    use crate::sparse::gallery::{anisotropic_2d, poisson_1d, poisson_2d};
    use approx::assert_relative_eq;
    use ndarray::Array1;
    use num_complex::Complex64;

    struct Setup {
        a: CsrMatrix<f64>,
        s: StrengthGraph,
        split: Splitting,
        grid: CoarseGrid,
    }

    fn setup(a: CsrMatrix<f64>, marking: Marking, method: Coarsening) -> Setup {
        let s = StrengthGraph::mark(&a, marking).unwrap();
        let split = coarsen(&a, &s, method);
        let grid = CoarseGrid::generate(&split);
        Setup { a, s, split, grid }
    }

    fn row_sum(p: &CsrMatrix<f64>, i: usize) -> f64 {
        p.row_entries(i).map(|(_, v)| v).sum()
    }

    fn zero_row_sum(a: &CsrMatrix<f64>, i: usize) -> bool {
        a.row_entries(i).map(|(_, v)| v).sum::<f64>().abs() < 1e-12
    }

    #[test]
    fn test_average_interpolation_1d() {
        let st = setup(poisson_1d(7), Marking::default(), Coarsening::RugeStuben);
        let p: CsrMatrix<f64> = average_interpolation(&st.s, &st.split, &st.grid);

        assert_eq!(p.num_rows, 7);
        assert_eq!(p.num_cols, 3);
        // C = {1, 3, 5}
        assert_relative_eq!(p.get(1, 0), 1.0);
        assert_relative_eq!(p.get(2, 0), 0.5);
        assert_relative_eq!(p.get(2, 1), 0.5);
        assert_relative_eq!(p.get(0, 0), 1.0);
        assert_relative_eq!(p.get(6, 2), 1.0);
    }

    #[test]
    fn test_ruge_stuben_interpolation_1d() {
        let st = setup(poisson_1d(7), Marking::default(), Coarsening::RugeStuben);
        let p = ruge_stuben_interpolation(
            &st.a,
            &st.s,
            &st.split,
            &st.grid,
            &InterpolationOptions::default(),
        );

        assert_relative_eq!(p.get(3, 1), 1.0);
        assert_relative_eq!(p.get(4, 1), 0.5);
        assert_relative_eq!(p.get(4, 2), 0.5);
        // boundary point only sees one coarse neighbour
        assert_relative_eq!(p.get(0, 0), 0.5);
    }

    #[test]
    fn test_ruge_stuben_preserves_constants() {
        for a in [poisson_2d(10, 10), anisotropic_2d(10, 10, 0.01)] {
            let st = setup(a, Marking::default(), Coarsening::RugeStuben);
            let p = ruge_stuben_interpolation(
                &st.a,
                &st.s,
                &st.split,
                &st.grid,
                &InterpolationOptions::default(),
            );

            for i in 0..st.a.num_rows {
                if p.row_len(i) > 0 && zero_row_sum(&st.a, i) {
                    assert_relative_eq!(row_sum(&p, i), 1.0, epsilon = 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_every_coarse_point_has_identity_row() {
        let st = setup(poisson_2d(8, 8), Marking::default(), Coarsening::RugeStuben);
        let p = interpolate(
            &st.a,
            &st.s,
            &st.split,
            &st.grid,
            Interpolation::RugeStuben,
            &InterpolationOptions::default(),
        )
        .unwrap();

        for (c, &f) in st.grid.coarse_to_fine().iter().enumerate() {
            assert_eq!(p.row_len(f), 1);
            assert_relative_eq!(p.get(f, c), 1.0);
        }
        // every fine point with a strong dependency interpolates
        for i in 0..64 {
            if !st.s.dependencies(i).is_empty() {
                assert!(p.row_len(i) > 0);
            }
        }
    }

    #[test]
    fn test_strong_fine_neighbour_without_coarse_link_is_lumped() {
        // 0 and 1 fine, 2 coarse; row 1 has no coupling to C_0 = {2}
        let split = Splitting::from_states(vec![
            PointState::Fine,
            PointState::Fine,
            PointState::Coarse,
        ]);
        let grid = CoarseGrid::generate(&split);
        let s = StrengthGraph::from_dependencies(vec![vec![1, 2], vec![0], vec![0]]);
        let options = InterpolationOptions::default();

        for scale in [1.0, 1e-20] {
            let a = CsrMatrix::from_triplets(
                3,
                3,
                vec![
                    (0, 0, 4.0 * scale),
                    (0, 1, -scale),
                    (0, 2, -2.0 * scale),
                    (1, 0, -scale),
                    (1, 1, 4.0 * scale),
                    (2, 0, -2.0 * scale),
                    (2, 2, 4.0 * scale),
                ],
            );
            let p = ruge_stuben_interpolation(&a, &s, &split, &grid, &options);

            // a_01 joins the denominator: 2 / (4 - 1)
            assert_eq!(p.row_len(0), 1);
            assert_relative_eq!(p.get(0, 0), 2.0 / 3.0, epsilon = 1e-12);
            assert_eq!(p.row_len(1), 0);
            assert_relative_eq!(p.get(2, 0), 1.0);
        }

        // with a link to C_0 the same coupling is distributed instead: 3 / 4
        let a = CsrMatrix::from_triplets(
            3,
            3,
            vec![
                (0, 0, 4.0),
                (0, 1, -1.0),
                (0, 2, -2.0),
                (1, 0, -1.0),
                (1, 1, 4.0),
                (1, 2, -1.0),
                (2, 0, -2.0),
                (2, 2, 4.0),
            ],
        );
        let p = ruge_stuben_interpolation(&a, &s, &split, &grid, &options);
        assert_relative_eq!(p.get(0, 0), 0.75, epsilon = 1e-12);
    }

    #[test]
    fn test_vanishing_denominator_leaves_row_empty() {
        // a_00 plus the weak coupling a_01 cancels exactly
        let a = CsrMatrix::from_triplets(
            3,
            3,
            vec![(0, 0, 1.0), (0, 1, -1.0), (0, 2, -1.0), (1, 1, 1.0), (2, 2, 1.0)],
        );
        let split = Splitting::from_states(vec![
            PointState::Fine,
            PointState::Fine,
            PointState::Coarse,
        ]);
        let grid = CoarseGrid::generate(&split);
        let s = StrengthGraph::from_dependencies(vec![vec![2], vec![], vec![]]);

        let p = ruge_stuben_interpolation(&a, &s, &split, &grid, &InterpolationOptions::default());
        assert_eq!(p.row_len(0), 0);
        assert_eq!(p.row_len(1), 0);
        assert_relative_eq!(p.get(2, 0), 1.0);
    }

    #[test]
    fn test_vanek_zero_filtered_diagonal_keeps_tentative_row() {
        // row 0: diagonal plus its only (weak) coupling sums to zero
        let a = CsrMatrix::from_triplets(
            3,
            3,
            vec![
                (0, 0, 1.0),
                (0, 1, -1.0),
                (1, 0, -1.0),
                (1, 1, 2.0),
                (1, 2, -1.0),
                (2, 1, -1.0),
                (2, 2, 2.0),
            ],
        );
        let split = Splitting::from_states(vec![
            PointState::Coarse,
            PointState::Fine,
            PointState::Coarse,
        ]);
        let grid = CoarseGrid::generate(&split);
        let s = StrengthGraph::from_dependencies(vec![vec![], vec![2], vec![1]]);
        let options = InterpolationOptions {
            vanek_damping: Some(0.5),
            ..Default::default()
        };

        let p = vanek_interpolation(&a, &s, &grid, &options).unwrap();
        assert_eq!(p.row_len(0), 1);
        assert_relative_eq!(p.get(0, 0), 1.0);
        // A^F row 1 = [0, 1, -1], row 2 = [0, -1, 2]
        assert_relative_eq!(p.get(1, 1), 0.5, epsilon = 1e-12);
        assert_relative_eq!(p.get(2, 1), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_truncation_keeps_row_sum() {
        let mut row = vec![(0, 0.5_f64), (1, 0.3), (2, 0.05), (3, 0.15)];
        let options = InterpolationOptions {
            trunc_factor: 0.2,
            ..Default::default()
        };
        truncate_row(&mut row, &options);

        assert_eq!(row.iter().map(|r| r.0).collect::<Vec<_>>(), vec![0, 1, 3]);
        let sum: f64 = row.iter().map(|r| r.1).sum();
        assert_relative_eq!(sum, 1.0, epsilon = 1e-14);
        assert_relative_eq!(row[0].1, 0.5 / 0.95, epsilon = 1e-14);

        let mut row = vec![(4, 0.1_f64), (1, 0.6), (2, 0.3)];
        let options = InterpolationOptions {
            max_elements: 2,
            ..Default::default()
        };
        truncate_row(&mut row, &options);
        assert_eq!(row.len(), 2);
        assert_eq!(row[0].0, 1);
        assert_eq!(row[1].0, 2);
        assert_relative_eq!(row[0].1 + row[1].1, 1.0, epsilon = 1e-14);
    }

    #[test]
    fn test_vanek_interpolation_1d() {
        let st = setup(
            poisson_1d(9),
            Marking::Vanek { theta: 0.08 },
            Coarsening::Vanek,
        );
        let p = vanek_interpolation(&st.a, &st.s, &st.grid, &InterpolationOptions::default())
            .unwrap();

        assert_eq!(p.num_cols, 3);
        // interior rows reproduce constants
        for i in 1..8 {
            assert_relative_eq!(row_sum(&p, i), 1.0, epsilon = 1e-12);
        }
        // smoothing widens the stencil across aggregate borders
        assert!(p.get(2, 0).abs() > 0.0);
        assert!(p.get(2, 1) > p.get(2, 0));
    }

    #[test]
    fn test_vanek_with_fixed_damping() {
        let st = setup(
            poisson_1d(9),
            Marking::Vanek { theta: 0.08 },
            Coarsening::Vanek,
        );
        let options = InterpolationOptions {
            vanek_damping: Some(0.5),
            ..Default::default()
        };
        let p = vanek_interpolation(&st.a, &st.s, &st.grid, &options).unwrap();
        // row 1: (A P_tent)_1 = e_0 - e_1, scaled by 0.5 / 2
        assert_relative_eq!(p.get(1, 0), 0.75, epsilon = 1e-12);
        assert_relative_eq!(p.get(1, 1), 0.25, epsilon = 1e-12);

        let bad = InterpolationOptions {
            vanek_damping: Some(-1.0),
            ..Default::default()
        };
        let err = interpolate(&st.a, &st.s, &st.split, &st.grid, Interpolation::Vanek, &bad)
            .unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_galerkin_is_symmetric() {
        let st = setup(poisson_2d(6, 6), Marking::default(), Coarsening::RugeStuben);
        let p = ruge_stuben_interpolation(
            &st.a,
            &st.s,
            &st.split,
            &st.grid,
            &InterpolationOptions::default(),
        );
        let r = restriction(&p);
        let ac = galerkin(&r, &st.a, &p);

        assert_eq!(ac.num_rows, st.grid.num_coarse());
        let dense = ac.to_dense();
        for i in 0..ac.num_rows {
            assert!(dense[[i, i]] > 0.0);
            for j in 0..ac.num_cols {
                assert_relative_eq!(dense[[i, j]], dense[[j, i]], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_complex_restriction_is_conjugate() {
        let p = CsrMatrix::from_triplets(
            2,
            1,
            vec![(0, 0, Complex64::new(1.0, 1.0)), (1, 0, Complex64::new(0.0, -2.0))],
        );
        let r = restriction(&p);
        assert_eq!(r.num_rows, 1);
        assert_eq!(r.get(0, 0), Complex64::new(1.0, -1.0));
        assert_eq!(r.get(0, 1), Complex64::new(0.0, 2.0));

        let x = Array1::from_vec(vec![Complex64::new(1.0, 0.0), Complex64::new(1.0, 0.0)]);
        let y = r.matvec(&x);
        assert_eq!(y[0], Complex64::new(1.0, 1.0));
    }
}
