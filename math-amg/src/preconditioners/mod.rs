//! Preconditioners for iterative solvers
//!
//! Preconditioners approximate A^(-1) to accelerate convergence of iterative methods.
//!
//! # Available Preconditioners
//!
//! - **AmgPreconditioner**: one multigrid cycle over an AMG hierarchy
//! - **TffPreconditioner**: tangential frequency filtering block decomposition
//!   (re-exported from [`crate::tff`])

mod amg;

pub use amg::{
    AmgConfig, AmgCycle, AmgDiagnostics, AmgPreconditioner, AmgSmoother, CoarseSolver,
};
pub use crate::tff::TffPreconditioner;

// Re-export IdentityPreconditioner from traits
pub use crate::traits::IdentityPreconditioner;
