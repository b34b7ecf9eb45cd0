//! Tangential frequency filtering (TFF)
//!
//! A block factorization for matrices on tensor grids. The grid is split
//! into planes and lines ([`BlockVector`]); the Schur complements of block
//! LU are approximated by a diagonal correction `Θ_i` chosen so that the
//! factorization is exact on a smooth test vector ([`TestVector`]).
//!
//! In two dimensions every line block is inverted exactly, so the
//! preconditioner reproduces `A^{-1}` on all vectors whose line blocks are
//! multiples of the test vector. In three dimensions the plane blocks are
//! themselves approximated recursively.

mod block;
mod decomposition;
mod test_vector;

pub use block::BlockVector;
pub use decomposition::{TffDecomposition, TffPreconditioner};
pub use test_vector::TestVector;

use crate::error::{AmgError, Result};
use serde::{Deserialize, Serialize};

/// Options for building a TFF decomposition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TffConfig {
    /// Test vector the filtered blocks must reproduce
    pub test_vector: TestVector,

    /// Test vector entries smaller than this get no filtering correction
    pub zero_tolerance: f64,
}

impl Default for TffConfig {
    fn default() -> Self {
        Self {
            test_vector: TestVector::default(),
            zero_tolerance: 1e-10,
        }
    }
}

impl TffConfig {
    pub fn validate(&self) -> Result<()> {
        self.test_vector.validate()?;
        if !(self.zero_tolerance.is_finite() && self.zero_tolerance >= 0.0) {
            return Err(AmgError::InvalidParameter {
                name: "zero_tolerance",
                value: self.zero_tolerance,
                reason: "must be finite and non-negative",
            });
        }
        Ok(())
    }
}
