//! Multi-level AMG transfer driver
//!
//! Repeats marking → coarsening → grid generation → interpolation →
//! restriction → Galerkin product until one of the stop criteria fires.
//! A coarse level that fails a reduction test is discarded, so the last
//! level of the hierarchy is always the last one that was accepted.

use super::coarsen::{Coarsening, Splitting, coarsen};
use super::grid::CoarseGrid;
use super::interpolation::{Interpolation, InterpolationOptions, galerkin, interpolate, restriction};
use super::strength::{Marking, StrengthGraph};
use crate::error::{AmgError, Result};
use crate::sparse::CsrMatrix;
use crate::traits::ComplexField;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hierarchy setup options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmgTransferConfig {
    /// Strength-of-connection rule
    ///
    /// A `Vanek` threshold is halved on every coarser level.
    pub marking: Marking,

    /// Coarsening algorithm
    pub coarsening: Coarsening,

    /// Interpolation scheme
    pub interpolation: Interpolation,

    /// Truncation and smoothing options for the interpolation
    pub interpolation_options: InterpolationOptions,

    /// Maximum number of levels, the finest included
    pub level_limit: usize,

    /// Stop once a level has at most this many unknowns
    pub vect_limit: usize,

    /// Stop once a level has at most this many nonzeros (0 disables)
    pub mat_limit: usize,

    /// Reject a coarse level with more than `v_red_limit * n_fine` unknowns
    pub v_red_limit: f64,

    /// Reject a coarse level with more than `m_red_limit * nnz_fine` nonzeros
    pub m_red_limit: f64,
}

impl Default for AmgTransferConfig {
    fn default() -> Self {
        Self {
            marking: Marking::default(),
            coarsening: Coarsening::default(),
            interpolation: Interpolation::default(),
            interpolation_options: InterpolationOptions::default(),
            level_limit: 25,
            vect_limit: 50,
            mat_limit: 0,
            v_red_limit: 0.9,
            m_red_limit: 1.5,
        }
    }
}

impl AmgTransferConfig {
    /// Vanek aggregation with smoothed-aggregation interpolation
    pub fn smoothed_aggregation() -> Self {
        Self {
            marking: Marking::Vanek { theta: 0.08 },
            coarsening: Coarsening::Vanek,
            interpolation: Interpolation::Vanek,
            ..Default::default()
        }
    }

    /// Check every option
    pub fn validate(&self) -> Result<()> {
        self.marking.validate()?;
        self.interpolation_options.validate()?;
        if self.level_limit == 0 {
            return Err(AmgError::InvalidParameter {
                name: "level_limit",
                value: 0.0,
                reason: "at least one level is required",
            });
        }
        if !(self.v_red_limit > 0.0 && self.v_red_limit <= 1.0) {
            return Err(AmgError::InvalidParameter {
                name: "v_red_limit",
                value: self.v_red_limit,
                reason: "must lie in (0, 1]",
            });
        }
        if !(self.m_red_limit.is_finite() && self.m_red_limit > 0.0) {
            return Err(AmgError::InvalidParameter {
                name: "m_red_limit",
                value: self.m_red_limit,
                reason: "must be finite and positive",
            });
        }
        Ok(())
    }

    /// Marking rule used on level `depth` (0 = finest)
    pub fn marking_for_level(&self, depth: usize) -> Marking {
        match self.marking {
            Marking::Vanek { theta } => Marking::Vanek {
                theta: theta * 0.5_f64.powi(depth as i32),
            },
            other => other,
        }
    }
}

/// Why the hierarchy stopped growing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// `level_limit` reached
    LevelLimit,
    /// Coarsest level is small enough (`vect_limit`)
    VectorLimit,
    /// Coarsest level is sparse enough (`mat_limit`)
    MatrixLimit,
    /// Coarsening produced no coarse point
    NoCoarsePoints,
    /// Coarse level kept too many unknowns (`v_red_limit`)
    InsufficientVectorReduction,
    /// Coarse operator grew too dense (`m_red_limit`)
    InsufficientMatrixReduction,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StopReason::LevelLimit => "level limit reached",
            StopReason::VectorLimit => "coarse grid below vector limit",
            StopReason::MatrixLimit => "coarse matrix below nonzero limit",
            StopReason::NoCoarsePoints => "no coarse points selected",
            StopReason::InsufficientVectorReduction => "insufficient unknown reduction",
            StopReason::InsufficientMatrixReduction => "insufficient nonzero reduction",
        };
        f.write_str(text)
    }
}

/// One level of the hierarchy
///
/// Transfer operators to the next coarser level are stored on the finer
/// level; the coarsest level has none.
#[derive(Debug, Clone)]
pub struct AmgLevel<T: ComplexField> {
    /// System matrix on this level
    pub matrix: CsrMatrix<T>,
    /// Prolongation from the next coarser level
    pub prolongation: Option<CsrMatrix<T>>,
    /// Restriction to the next coarser level
    pub restriction: Option<CsrMatrix<T>>,
    /// Coarse numbering of this level's points
    pub grid: Option<CoarseGrid>,
    /// C/F splitting (and aggregates) of this level's points
    pub splitting: Option<Splitting>,
}

impl<T: ComplexField> AmgLevel<T> {
    fn new(matrix: CsrMatrix<T>) -> Self {
        Self {
            matrix,
            prolongation: None,
            restriction: None,
            grid: None,
            splitting: None,
        }
    }

    /// Number of unknowns
    pub fn num_dofs(&self) -> usize {
        self.matrix.num_rows
    }

    /// Whether this level has transfer operators to a coarser one
    pub fn has_coarser(&self) -> bool {
        self.prolongation.is_some()
    }
}

/// Outcome of trying to coarsen one level
struct CoarseLevel<T: ComplexField> {
    matrix: CsrMatrix<T>,
    prolongation: CsrMatrix<T>,
    restriction: CsrMatrix<T>,
    grid: CoarseGrid,
    splitting: Splitting,
}

/// Matrix hierarchy from finest (index 0) to coarsest
#[derive(Debug, Clone)]
pub struct AmgHierarchy<T: ComplexField> {
    levels: Vec<AmgLevel<T>>,
    stop_reason: StopReason,
    setup_time_ms: f64,
}

impl<T: ComplexField> AmgHierarchy<T> {
    /// Build the hierarchy for a square, non-empty matrix
    pub fn build(matrix: &CsrMatrix<T>, config: &AmgTransferConfig) -> Result<Self> {
        let start = std::time::Instant::now();
        config.validate()?;
        if !matrix.is_square() {
            return Err(AmgError::NotSquare {
                rows: matrix.num_rows,
                cols: matrix.num_cols,
            });
        }
        if matrix.num_rows == 0 {
            return Err(AmgError::EmptyHierarchy);
        }

        log::info!(
            "AMG setup: level 0, {} unknowns, {} nonzeros",
            matrix.num_rows,
            matrix.nnz()
        );

        let mut levels = vec![AmgLevel::new(matrix.clone())];
        let stop_reason = loop {
            let depth = levels.len() - 1;
            if levels.len() >= config.level_limit {
                break StopReason::LevelLimit;
            }

            let fine = &levels[depth].matrix;
            let coarse = match Self::coarsen_level(fine, depth, config)? {
                Ok(coarse) => coarse,
                Err(reason) => break reason,
            };

            log::info!(
                "AMG setup: level {}, {} unknowns ({:.2} of fine), {} nonzeros",
                depth + 1,
                coarse.matrix.num_rows,
                coarse.matrix.num_rows as f64 / fine.num_rows as f64,
                coarse.matrix.nnz()
            );

            let level = &mut levels[depth];
            level.prolongation = Some(coarse.prolongation);
            level.restriction = Some(coarse.restriction);
            level.grid = Some(coarse.grid);
            level.splitting = Some(coarse.splitting);
            levels.push(AmgLevel::new(coarse.matrix));
        };

        let setup_time_ms = start.elapsed().as_secs_f64() * 1000.0;
        log::info!(
            "AMG setup: {} levels in {:.2} ms, stopped: {}",
            levels.len(),
            setup_time_ms,
            stop_reason
        );

        Ok(Self {
            levels,
            stop_reason,
            setup_time_ms,
        })
    }

    /// Coarsen one level, or say why not
    fn coarsen_level(
        fine: &CsrMatrix<T>,
        depth: usize,
        config: &AmgTransferConfig,
    ) -> Result<std::result::Result<CoarseLevel<T>, StopReason>> {
        let n = fine.num_rows;
        if n <= config.vect_limit {
            return Ok(Err(StopReason::VectorLimit));
        }
        if config.mat_limit > 0 && fine.nnz() <= config.mat_limit {
            return Ok(Err(StopReason::MatrixLimit));
        }

        let strength = StrengthGraph::mark(fine, config.marking_for_level(depth))?;
        let splitting = coarsen(fine, &strength, config.coarsening);
        let nc = splitting.num_coarse();
        if nc == 0 {
            return Ok(Err(StopReason::NoCoarsePoints));
        }
        if nc as f64 > config.v_red_limit * n as f64 {
            log::debug!("level {depth}: {nc} of {n} points coarse, level rejected");
            return Ok(Err(StopReason::InsufficientVectorReduction));
        }

        let grid = CoarseGrid::generate(&splitting);
        let prolongation = interpolate(
            fine,
            &strength,
            &splitting,
            &grid,
            config.interpolation,
            &config.interpolation_options,
        )?;
        let restriction = restriction(&prolongation);
        let matrix = galerkin(&restriction, fine, &prolongation);

        if matrix.nnz() as f64 > config.m_red_limit * fine.nnz() as f64 {
            log::debug!(
                "level {depth}: coarse operator has {} nonzeros against {}, level rejected",
                matrix.nnz(),
                fine.nnz()
            );
            return Ok(Err(StopReason::InsufficientMatrixReduction));
        }

        Ok(Ok(CoarseLevel {
            matrix,
            prolongation,
            restriction,
            grid,
            splitting,
        }))
    }

    pub fn levels(&self) -> &[AmgLevel<T>] {
        &self.levels
    }

    pub fn level(&self, i: usize) -> &AmgLevel<T> {
        &self.levels[i]
    }

    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// Coarsest level
    pub fn coarsest(&self) -> &AmgLevel<T> {
        &self.levels[self.levels.len() - 1]
    }

    /// Unknowns per level
    pub fn level_sizes(&self) -> Vec<usize> {
        self.levels.iter().map(AmgLevel::num_dofs).collect()
    }

    /// Nonzeros per level
    pub fn level_nnz(&self) -> Vec<usize> {
        self.levels.iter().map(|l| l.matrix.nnz()).collect()
    }

    /// Sum of unknowns over all levels divided by the fine unknowns
    pub fn grid_complexity(&self) -> f64 {
        let sizes = self.level_sizes();
        sizes.iter().sum::<usize>() as f64 / sizes[0] as f64
    }

    /// Sum of nonzeros over all levels divided by the fine nonzeros
    pub fn operator_complexity(&self) -> f64 {
        let nnz = self.level_nnz();
        if nnz[0] == 0 {
            return 1.0;
        }
        nnz.iter().sum::<usize>() as f64 / nnz[0] as f64
    }

    pub fn stop_reason(&self) -> StopReason {
        self.stop_reason
    }

    pub fn setup_time_ms(&self) -> f64 {
        self.setup_time_ms
    }
}
