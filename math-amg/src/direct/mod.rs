//! Direct solvers for linear systems
//!
//! - [`lu_factorize`] / [`lu_solve`]: LU decomposition with partial pivoting,
//!   used for the coarsest multigrid level and for TFF line blocks

mod lu;

pub use lu::{LuFactorization, lu_factorize, lu_solve};
