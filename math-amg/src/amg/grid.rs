//! Coarse grid generation
//!
//! Numbers the coarse points of a [`Splitting`] in fine order and emits the
//! interpolation-matrix pattern: every coarse point gets an injection edge
//! to its coarse copy, every aggregated point an edge to the coarse copy of
//! its aggregate root.

use super::coarsen::Splitting;
use crate::sparse::{CsrBuilder, CsrMatrix};
use crate::traits::ComplexField;

/// Index maps between a fine level and the coarse level built from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoarseGrid {
    coarse_to_fine: Vec<usize>,
    fine_to_coarse: Vec<Option<usize>>,
    /// Coarse index of the aggregate each point belongs to
    parents: Vec<Option<usize>>,
    aggregated: bool,
}

impl CoarseGrid {
    /// Number the coarse points of a splitting
    pub fn generate(splitting: &Splitting) -> Self {
        let n = splitting.len();
        let coarse_to_fine = splitting.coarse_points();

        let mut fine_to_coarse = vec![None; n];
        for (c, &f) in coarse_to_fine.iter().enumerate() {
            fine_to_coarse[f] = Some(c);
        }

        let (parents, aggregated) = match splitting.aggregates() {
            Some(roots) => (
                roots
                    .iter()
                    .map(|root| root.and_then(|r| fine_to_coarse[r]))
                    .collect(),
                true,
            ),
            None => (fine_to_coarse.clone(), false),
        };

        Self {
            coarse_to_fine,
            fine_to_coarse,
            parents,
            aggregated,
        }
    }

    pub fn num_coarse(&self) -> usize {
        self.coarse_to_fine.len()
    }

    pub fn num_fine(&self) -> usize {
        self.fine_to_coarse.len()
    }

    /// Fine index of every coarse point
    pub fn coarse_to_fine(&self) -> &[usize] {
        &self.coarse_to_fine
    }

    /// Coarse index of fine point `i`, if it is a coarse point
    pub fn fine_to_coarse(&self, i: usize) -> Option<usize> {
        self.fine_to_coarse[i]
    }

    /// Coarse parent of point `i`
    ///
    /// For a C/F splitting only coarse points have a parent (themselves);
    /// for an aggregation every aggregated point has its root's index.
    pub fn parent(&self, i: usize) -> Option<usize> {
        self.parents[i]
    }

    /// Whether the grid came from an aggregation
    pub fn is_aggregation(&self) -> bool {
        self.aggregated
    }

    /// Injection pattern `n_f × n_c`: coarse point → its coarse copy, weight 1
    pub fn injection<T: ComplexField>(&self) -> CsrMatrix<T> {
        self.pattern(&self.fine_to_coarse)
    }

    /// Piecewise-constant prolongator from the parent map
    pub fn tentative_prolongation<T: ComplexField>(&self) -> CsrMatrix<T> {
        self.pattern(&self.parents)
    }

    fn pattern<T: ComplexField>(&self, map: &[Option<usize>]) -> CsrMatrix<T> {
        let mut builder = CsrBuilder::new(self.num_fine(), self.num_coarse());
        for target in map {
            builder.add_row_entries(target.iter().map(|&c| (c, T::one())));
        }
        builder.finish()
    }
}
