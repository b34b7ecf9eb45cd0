//! Iterative solvers for linear systems
//!
//! - [`pcg`]: preconditioned Conjugate Gradient, the outer Krylov method for
//!   AMG and TFF preconditioners on symmetric positive definite systems
//! - [`cg`]: unpreconditioned CG

mod cg;

pub use cg::{CgConfig, CgSolution, cg, pcg};
