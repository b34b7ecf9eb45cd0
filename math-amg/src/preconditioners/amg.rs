//! Algebraic Multigrid (AMG) Preconditioner
//!
//! Applies one multigrid cycle over an [`AmgHierarchy`] as an approximate
//! inverse, for use inside conjugate gradients or as a stand-alone
//! iteration.
//!
//! ## Features
//!
//! - **Cycles**: V, W (two coarse visits per level) and F (F-cycle on the
//!   coarse level followed by a V-cycle)
//! - **Smoothers**: damped Jacobi, l1-Jacobi and symmetric Gauss-Seidel
//! - **Coarsest level**: dense LU, or a fixed number of smoothing sweeps
//!
//! ## Usage
//!
//! ```ignore
//! use math_amg::{AmgConfig, AmgPreconditioner, Preconditioner};
//!
//! let precond = AmgPreconditioner::from_csr(&matrix, AmgConfig::default())?;
//! let z = precond.apply(&residual);
//! ```

use crate::amg::{AmgHierarchy, AmgLevel, AmgTransferConfig, Interpolation, StopReason};
use crate::direct::LuFactorization;
use crate::error::{AmgError, Result};
use crate::parallel::parallel_map_indexed;
use crate::sparse::CsrMatrix;
use crate::traits::{ComplexField, Preconditioner};
use ndarray::Array1;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Diagonal magnitude, relative to the largest entry of its row, treated as
/// zero by the smoothers
const DIAG_TOLERANCE: f64 = 1e-15;

/// Largest coarsest level factorized densely
const MAX_DIRECT_SIZE: usize = 4096;

/// Smoother type for AMG relaxation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmgSmoother {
    /// Jacobi relaxation - fully parallel, requires damping (ω ≈ 0.6-0.8)
    #[default]
    Jacobi,

    /// l1-Jacobi - Jacobi with l1 row norm scaling, no damping needed
    L1Jacobi,

    /// Symmetric Gauss-Seidel - forward then backward sweep
    SymmetricGaussSeidel,
}

/// AMG cycle type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmgCycle {
    /// V-cycle: one visit to each level
    #[default]
    VCycle,

    /// W-cycle: two visits to coarser levels (more expensive)
    WCycle,

    /// F-cycle: hybrid between V and W
    FCycle,
}

/// Solver on the coarsest level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoarseSolver {
    /// Dense LU factorization
    #[default]
    Direct,

    /// `coarse_sweeps` sweeps of the configured smoother
    Smoother,
}

/// Configuration for AMG preconditioner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmgConfig {
    /// Hierarchy setup
    pub transfer: AmgTransferConfig,

    /// Cycle type (V, W, or F)
    pub cycle: AmgCycle,

    /// Smoother for pre- and post-relaxation
    pub smoother: AmgSmoother,

    /// Number of pre-smoothing sweeps (ν₁)
    pub num_pre_smooth: usize,

    /// Number of post-smoothing sweeps (ν₂)
    pub num_post_smooth: usize,

    /// Jacobi damping parameter (ω)
    pub jacobi_weight: f64,

    /// Coarsest-level solver
    pub coarse_solver: CoarseSolver,

    /// Smoothing sweeps on the coarsest level when not solving directly
    pub coarse_sweeps: usize,
}

impl Default for AmgConfig {
    fn default() -> Self {
        Self {
            transfer: AmgTransferConfig::default(),
            cycle: AmgCycle::default(),
            smoother: AmgSmoother::default(),
            num_pre_smooth: 1,
            num_post_smooth: 1,
            jacobi_weight: 0.6667, // 2/3 is optimal for Poisson
            coarse_solver: CoarseSolver::default(),
            coarse_sweeps: 20,
        }
    }
}

impl AmgConfig {
    /// Classical Ruge–Stüben AMG with Gauss-Seidel smoothing
    pub fn for_ruge_stuben() -> Self {
        Self {
            smoother: AmgSmoother::SymmetricGaussSeidel,
            ..Default::default()
        }
    }

    /// Vanek aggregation with smoothed prolongation
    pub fn for_smoothed_aggregation() -> Self {
        Self {
            transfer: AmgTransferConfig::smoothed_aggregation(),
            smoother: AmgSmoother::Jacobi,
            num_pre_smooth: 2,
            num_post_smooth: 2,
            ..Default::default()
        }
    }

    /// Configuration for difficult/ill-conditioned problems
    pub fn for_difficult_problems() -> Self {
        let mut transfer = AmgTransferConfig {
            interpolation: Interpolation::RugeStuben,
            ..Default::default()
        };
        transfer.interpolation_options.max_elements = 8;
        Self {
            transfer,
            cycle: AmgCycle::WCycle,
            smoother: AmgSmoother::SymmetricGaussSeidel,
            num_pre_smooth: 2,
            num_post_smooth: 2,
            ..Default::default()
        }
    }

    /// Check every option
    pub fn validate(&self) -> Result<()> {
        self.transfer.validate()?;
        if !(self.jacobi_weight > 0.0 && self.jacobi_weight < 2.0) {
            return Err(AmgError::InvalidParameter {
                name: "jacobi_weight",
                value: self.jacobi_weight,
                reason: "must lie in (0, 2)",
            });
        }
        if self.coarse_solver == CoarseSolver::Smoother && self.coarse_sweeps == 0 {
            return Err(AmgError::InvalidParameter {
                name: "coarse_sweeps",
                value: 0.0,
                reason: "smoothing coarse solver needs at least one sweep",
            });
        }
        Ok(())
    }
}

/// Per-level smoother data
#[derive(Debug, Clone)]
struct SmootherData<T: ComplexField> {
    /// Inverse diagonal for Jacobi smoothing
    diag_inv: Array1<T>,
    /// Inverse l1 row norms for l1-Jacobi
    l1_inv: Array1<T>,
}

impl<T: ComplexField> SmootherData<T> {
    fn new(matrix: &CsrMatrix<T>) -> Self {
        let n = matrix.num_rows;
        let diag_inv = parallel_map_indexed(n, |i| {
            let diag = matrix.get(i, i);
            if magnitude(diag) > DIAG_TOLERANCE * row_scale(matrix, i) {
                diag.inv()
            } else {
                T::zero()
            }
        });
        let l1_inv = parallel_map_indexed(n, |i| {
            let sum: f64 = matrix.row_entries(i).map(|(_, v)| magnitude(v)).sum();
            if sum > 0.0 {
                T::from_f64(1.0 / sum)
            } else {
                T::zero()
            }
        });

        let zero_rows = diag_inv.iter().filter(|d| d.is_zero()).count();
        if zero_rows > 0 {
            log::warn!("{zero_rows} rows with zero diagonal are skipped by Jacobi smoothing");
        }

        Self {
            diag_inv: Array1::from_vec(diag_inv),
            l1_inv: Array1::from_vec(l1_inv),
        }
    }
}

/// Algebraic Multigrid Preconditioner
#[derive(Debug, Clone)]
pub struct AmgPreconditioner<T: ComplexField> {
    hierarchy: AmgHierarchy<T>,
    smoothers: Vec<SmootherData<T>>,
    coarse_lu: Option<LuFactorization<T>>,
    config: AmgConfig,
}

impl<T: ComplexField> AmgPreconditioner<T> {
    /// Build the hierarchy and the cycle data from a CSR matrix
    pub fn from_csr(matrix: &CsrMatrix<T>, config: AmgConfig) -> Result<Self> {
        config.validate()?;
        let hierarchy = AmgHierarchy::build(matrix, &config.transfer)?;
        Self::from_hierarchy(hierarchy, config)
    }

    /// Wrap an existing hierarchy
    pub fn from_hierarchy(hierarchy: AmgHierarchy<T>, config: AmgConfig) -> Result<Self> {
        config.validate()?;
        let smoothers = hierarchy
            .levels()
            .iter()
            .map(|l| SmootherData::new(&l.matrix))
            .collect();

        let coarsest = &hierarchy.coarsest().matrix;
        let coarse_lu = match config.coarse_solver {
            CoarseSolver::Direct if coarsest.num_rows > MAX_DIRECT_SIZE => {
                log::warn!(
                    "coarsest level has {} unknowns, too large for LU, smoothing instead",
                    coarsest.num_rows
                );
                None
            }
            CoarseSolver::Direct => match LuFactorization::from_csr(coarsest) {
                Ok(lu) => Some(lu),
                Err(e) => {
                    log::warn!("coarse LU failed ({e}), falling back to smoothing");
                    None
                }
            },
            CoarseSolver::Smoother => None,
        };

        Ok(Self {
            hierarchy,
            smoothers,
            coarse_lu,
            config,
        })
    }

    /// Get number of levels in hierarchy
    pub fn num_levels(&self) -> usize {
        self.hierarchy.num_levels()
    }

    /// Get setup time in milliseconds
    pub fn setup_time_ms(&self) -> f64 {
        self.hierarchy.setup_time_ms()
    }

    /// Get grid complexity (sum of DOFs / fine DOFs)
    pub fn grid_complexity(&self) -> f64 {
        self.hierarchy.grid_complexity()
    }

    /// Get operator complexity (sum of nnz / fine nnz)
    pub fn operator_complexity(&self) -> f64 {
        self.hierarchy.operator_complexity()
    }

    pub fn hierarchy(&self) -> &AmgHierarchy<T> {
        &self.hierarchy
    }

    /// Get configuration
    pub fn config(&self) -> &AmgConfig {
        &self.config
    }

    /// Apply Jacobi smoothing: x = x + ω * D^{-1} * (b - A*x)
    fn smooth_jacobi(
        matrix: &CsrMatrix<T>,
        diag_inv: &Array1<T>,
        x: &mut Array1<T>,
        b: &Array1<T>,
        omega: T,
        num_sweeps: usize,
    ) {
        let n = x.len();
        for _ in 0..num_sweeps {
            let r = matrix.residual(b, x);
            let updates: Vec<T> = parallel_map_indexed(n, |i| omega * diag_inv[i] * r[i]);
            for (xi, delta) in x.iter_mut().zip(updates) {
                *xi += delta;
            }
        }
    }

    /// Apply symmetric Gauss-Seidel smoothing
    fn smooth_sym_gauss_seidel(
        matrix: &CsrMatrix<T>,
        x: &mut Array1<T>,
        b: &Array1<T>,
        num_sweeps: usize,
    ) {
        let n = x.len();
        let relax = |x: &mut Array1<T>, i: usize| {
            let mut sum = b[i];
            let mut diag = T::zero();
            let mut scale = 0.0_f64;
            for (j, val) in matrix.row_entries(i) {
                scale = scale.max(magnitude(val));
                if j == i {
                    diag += val;
                } else {
                    sum -= val * x[j];
                }
            }
            if magnitude(diag) > DIAG_TOLERANCE * scale {
                x[i] = sum * diag.inv();
            }
        };

        for _ in 0..num_sweeps {
            for i in 0..n {
                relax(x, i);
            }
            for i in (0..n).rev() {
                relax(x, i);
            }
        }
    }

    fn smooth(&self, level: usize, x: &mut Array1<T>, b: &Array1<T>, num_sweeps: usize) {
        let matrix = &self.hierarchy.level(level).matrix;
        let data = &self.smoothers[level];
        match self.config.smoother {
            AmgSmoother::Jacobi => Self::smooth_jacobi(
                matrix,
                &data.diag_inv,
                x,
                b,
                T::from_f64(self.config.jacobi_weight),
                num_sweeps,
            ),
            AmgSmoother::L1Jacobi => {
                Self::smooth_jacobi(matrix, &data.l1_inv, x, b, T::one(), num_sweeps)
            }
            AmgSmoother::SymmetricGaussSeidel => {
                Self::smooth_sym_gauss_seidel(matrix, x, b, num_sweeps)
            }
        }
    }

    fn coarse_solve(&self, level: usize, x: &mut Array1<T>, b: &Array1<T>) {
        if let Some(lu) = &self.coarse_lu {
            match lu.solve(b) {
                Ok(solution) => {
                    *x = solution;
                    return;
                }
                Err(e) => log::warn!("coarse LU solve failed: {e}"),
            }
        }
        self.smooth(level, x, b, self.config.coarse_sweeps);
    }

    /// One cycle of the given kind starting on `level`
    fn cycle(&self, level: usize, x: &mut Array1<T>, b: &Array1<T>, kind: AmgCycle) {
        let lvl: &AmgLevel<T> = self.hierarchy.level(level);
        let (Some(p), Some(r)) = (&lvl.prolongation, &lvl.restriction) else {
            self.coarse_solve(level, x, b);
            return;
        };

        self.smooth(level, x, b, self.config.num_pre_smooth);

        // restrict residual: r_c = R * (b - A*x)
        let r_coarse = r.matvec(&lvl.matrix.residual(b, x));
        let n_coarse = self.hierarchy.level(level + 1).num_dofs();
        let mut e_coarse = Array1::from_elem(n_coarse, T::zero());

        match kind {
            AmgCycle::VCycle => self.cycle(level + 1, &mut e_coarse, &r_coarse, AmgCycle::VCycle),
            AmgCycle::WCycle => {
                self.cycle(level + 1, &mut e_coarse, &r_coarse, AmgCycle::WCycle);
                self.cycle(level + 1, &mut e_coarse, &r_coarse, AmgCycle::WCycle);
            }
            AmgCycle::FCycle => {
                self.cycle(level + 1, &mut e_coarse, &r_coarse, AmgCycle::FCycle);
                self.cycle(level + 1, &mut e_coarse, &r_coarse, AmgCycle::VCycle);
            }
        }

        // prolongate correction: x = x + P * e_c
        *x += &p.matvec(&e_coarse);

        self.smooth(level, x, b, self.config.num_post_smooth);
    }
}

impl<T: ComplexField> Preconditioner<T> for AmgPreconditioner<T> {
    fn apply(&self, r: &Array1<T>) -> Array1<T> {
        let n = self.hierarchy.level(0).num_dofs();
        if r.len() != n {
            log::warn!("AMG applied to vector of length {} (expected {n})", r.len());
            return r.clone();
        }

        let mut z = Array1::from_elem(n, T::zero());
        self.cycle(0, &mut z, r, self.config.cycle);
        z
    }
}

/// Diagnostic information about AMG setup
#[derive(Debug, Clone, Serialize)]
pub struct AmgDiagnostics {
    /// Number of levels
    pub num_levels: usize,
    /// Grid complexity
    pub grid_complexity: f64,
    /// Operator complexity
    pub operator_complexity: f64,
    /// Setup time in milliseconds
    pub setup_time_ms: f64,
    /// DOFs per level
    pub level_dofs: Vec<usize>,
    /// NNZ per level
    pub level_nnz: Vec<usize>,
    /// Why coarsening stopped
    pub stop_reason: StopReason,
    /// Whether the coarsest level is solved by LU
    pub direct_coarse_solve: bool,
}

impl<T: ComplexField> AmgPreconditioner<T> {
    /// Get diagnostic information
    pub fn diagnostics(&self) -> AmgDiagnostics {
        AmgDiagnostics {
            num_levels: self.num_levels(),
            grid_complexity: self.grid_complexity(),
            operator_complexity: self.operator_complexity(),
            setup_time_ms: self.setup_time_ms(),
            level_dofs: self.hierarchy.level_sizes(),
            level_nnz: self.hierarchy.level_nnz(),
            stop_reason: self.hierarchy.stop_reason(),
            direct_coarse_solve: self.coarse_lu.is_some(),
        }
    }
}

#[inline]
fn magnitude<T: ComplexField>(v: T) -> f64 {
    v.norm().to_f64().unwrap_or(0.0)
}

fn row_scale<T: ComplexField>(matrix: &CsrMatrix<T>, i: usize) -> f64 {
    matrix
        .row_entries(i)
        .map(|(_, v)| magnitude(v))
        .fold(0.0, f64::max)
}
