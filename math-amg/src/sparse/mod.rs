//! Sparse matrix structures (CSR format)
//!
//! This module provides Compressed Sparse Row (CSR) storage for the
//! multigrid operators and a small gallery of model problems.

mod csr;
pub mod gallery;

pub use csr::{CsrBuilder, CsrMatrix};
