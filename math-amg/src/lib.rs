//! Algebraic multigrid and tangential frequency filtering preconditioners
//!
//! This crate builds multilevel preconditioners for sparse linear systems
//! arising from discretized elliptic problems, and applies them inside a
//! preconditioned Conjugate Gradient iteration.
//!
//! # Features
//!
//! - **Strength of connection**: absolute, relative, magnitude and Vanek markings
//! - **Coarsening**: Ruge–Stüben C/F splitting and Vanek aggregation
//! - **Interpolation**: averaging, classical Ruge–Stüben and smoothed aggregation
//! - **Hierarchy**: Galerkin coarse operators with level/size/reduction limits
//! - **Cycles**: V, W and F cycles with Jacobi, ℓ1-Jacobi or symmetric Gauss–Seidel
//! - **TFF**: block factorization on tensor grids, exact on a chosen test vector
//! - **Generic Scalar Types**: Works with f64, f32, Complex64, Complex32
//!
//! # Example
//!
//! ```ignore
//! use math_amg::{AmgConfig, AmgPreconditioner, CgConfig, gallery, pcg};
//! use ndarray::Array1;
//!
//! let a = gallery::poisson_2d::<f64>(64, 64);
//! let b = Array1::ones(a.num_rows);
//!
//! let amg = AmgPreconditioner::from_csr(&a, AmgConfig::default())?;
//! let solution = pcg(&a, &amg, &b, &CgConfig::default());
//! ```

pub mod amg;
pub mod config;
pub mod direct;
pub mod error;
pub mod io;
pub mod iterative;
pub mod parallel;
pub mod preconditioners;
pub mod sparse;
pub mod tff;
pub mod traits;

// Re-export main types
pub use error::{AmgError, Result};
pub use sparse::{CsrBuilder, CsrMatrix, gallery};
pub use traits::{ComplexField, LinearOperator, Preconditioner};

// Re-export the setup phase
pub use amg::{
    AmgHierarchy, AmgLevel, AmgTransferConfig, CoarseGrid, Coarsening, Interpolation,
    InterpolationOptions, Marking, PointState, Splitting, StopReason, StrengthGraph,
};

// Re-export solvers and preconditioners
pub use direct::{LuFactorization, lu_solve};
pub use iterative::{CgConfig, CgSolution, cg, pcg};
pub use preconditioners::{
    AmgConfig, AmgCycle, AmgDiagnostics, AmgPreconditioner, AmgSmoother, CoarseSolver,
    IdentityPreconditioner,
};
pub use tff::{BlockVector, TestVector, TffConfig, TffDecomposition, TffPreconditioner};

pub use config::{ConfigFormat, SolverConfig, load_config, save_config};
