//! Strength of connection
//!
//! Every off-diagonal entry of a row is classified as strong or weak. The
//! strong entries form a directed graph: `S_i` holds the points that `i`
//! strongly depends on, `S_i^T` the points that strongly depend on `i`.
//! Coarsening only ever looks at this graph; interpolation additionally
//! needs the weak entries from the matrix itself.

use crate::error::{AmgError, Result};
use crate::parallel::parallel_map_indexed;
use crate::sparse::CsrMatrix;
use crate::traits::ComplexField;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Rule used to decide which couplings are strong
///
/// Sign-based rules look at the negative real part of `a_ij` (M-matrix
/// convention: strong couplings are large negative entries); magnitude
/// rules look at `|a_ij|`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Marking {
    /// Every off-diagonal entry is strong
    All,

    /// Strong iff `-Re a_ij >= theta`
    Absolute {
        /// Absolute threshold
        theta: f64,
    },

    /// Strong iff `-Re a_ij >= theta * max_k (-Re a_ik)`
    Relative {
        /// Relative threshold in `[0, 1]`
        theta: f64,
    },

    /// Strong iff `|a_ij| >= theta * max_k |a_ik|`
    RelativeMagnitude {
        /// Relative threshold in `[0, 1]`
        theta: f64,
    },

    /// Strong iff `|a_ij| >= theta * sqrt(|a_ii| |a_jj|)` (aggregation criterion)
    Vanek {
        /// Threshold, typically `0.08 * 0.5^level`
        theta: f64,
    },
}

impl Default for Marking {
    fn default() -> Self {
        Marking::Relative { theta: 0.25 }
    }
}

impl Marking {
    /// Check the threshold range
    pub fn validate(&self) -> Result<()> {
        match *self {
            Marking::All => Ok(()),
            Marking::Relative { theta } | Marking::RelativeMagnitude { theta } => {
                if (0.0..=1.0).contains(&theta) {
                    Ok(())
                } else {
                    Err(AmgError::InvalidParameter {
                        name: "theta",
                        value: theta,
                        reason: "relative threshold must lie in [0, 1]",
                    })
                }
            }
            Marking::Absolute { theta } | Marking::Vanek { theta } => {
                if theta.is_finite() && theta >= 0.0 {
                    Ok(())
                } else {
                    Err(AmgError::InvalidParameter {
                        name: "theta",
                        value: theta,
                        reason: "threshold must be finite and non-negative",
                    })
                }
            }
        }
    }

    /// Threshold value, if the rule has one
    pub fn theta(&self) -> Option<f64> {
        match *self {
            Marking::All => None,
            Marking::Absolute { theta }
            | Marking::Relative { theta }
            | Marking::RelativeMagnitude { theta }
            | Marking::Vanek { theta } => Some(theta),
        }
    }
}

/// Directed graph of strong couplings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrengthGraph {
    /// `dependencies[i]` = S_i, sorted
    dependencies: Vec<Vec<usize>>,
    /// `influences[i]` = S_i^T, sorted
    influences: Vec<Vec<usize>>,
}

impl StrengthGraph {
    /// Scan every row of a square matrix and mark its strong couplings
    pub fn mark<T: ComplexField>(matrix: &CsrMatrix<T>, marking: Marking) -> Result<Self> {
        if !matrix.is_square() {
            return Err(AmgError::NotSquare {
                rows: matrix.num_rows,
                cols: matrix.num_cols,
            });
        }
        marking.validate()?;

        let n = matrix.num_rows;
        let diag_abs: Vec<f64> = match marking {
            Marking::Vanek { .. } => (0..n).map(|i| magnitude(matrix.get(i, i))).collect(),
            _ => Vec::new(),
        };

        let dependencies = parallel_map_indexed(n, |i| {
            let off_diag = || {
                matrix
                    .row_entries(i)
                    .filter(move |&(j, v)| j != i && !v.is_zero())
            };

            match marking {
                Marking::All => off_diag().map(|(j, _)| j).collect(),
                Marking::Absolute { theta } => off_diag()
                    .filter(|&(_, v)| -v.re_f64() >= theta && v.re_f64() < 0.0)
                    .map(|(j, _)| j)
                    .collect(),
                Marking::Relative { theta } => {
                    let max_neg = off_diag()
                        .map(|(_, v)| -v.re_f64())
                        .fold(0.0_f64, f64::max);
                    if max_neg <= 0.0 {
                        return Vec::new();
                    }
                    off_diag()
                        .filter(|&(_, v)| -v.re_f64() > 0.0 && -v.re_f64() >= theta * max_neg)
                        .map(|(j, _)| j)
                        .collect()
                }
                Marking::RelativeMagnitude { theta } => {
                    let max_abs = off_diag()
                        .map(|(_, v)| magnitude(v))
                        .fold(0.0_f64, f64::max);
                    off_diag()
                        .filter(|&(_, v)| magnitude(v) >= theta * max_abs)
                        .map(|(j, _)| j)
                        .collect()
                }
                Marking::Vanek { theta } => off_diag()
                    .filter(|&(j, v)| magnitude(v) >= theta * (diag_abs[i] * diag_abs[j]).sqrt())
                    .map(|(j, _)| j)
                    .collect::<Vec<usize>>(),
            }
        });

        Ok(Self::from_dependencies(dependencies))
    }

    /// Build the graph from explicit dependency lists
    pub fn from_dependencies(mut dependencies: Vec<Vec<usize>>) -> Self {
        let n = dependencies.len();
        let mut influences = vec![Vec::new(); n];
        for (i, deps) in dependencies.iter_mut().enumerate() {
            deps.sort_unstable();
            deps.dedup();
            for &j in deps.iter() {
                assert!(j < n, "strong dependency {j} outside graph of size {n}");
                influences[j].push(i);
            }
        }
        // rows were visited in order, so influences are already sorted
        Self {
            dependencies,
            influences,
        }
    }

    /// Number of points
    pub fn num_rows(&self) -> usize {
        self.dependencies.len()
    }

    /// Total number of strong couplings
    pub fn num_strong(&self) -> usize {
        self.dependencies.iter().map(Vec::len).sum()
    }

    /// S_i: points that `i` strongly depends on
    pub fn dependencies(&self, i: usize) -> &[usize] {
        &self.dependencies[i]
    }

    /// S_i^T: points that strongly depend on `i`
    pub fn influences(&self, i: usize) -> &[usize] {
        &self.influences[i]
    }

    /// Whether `a_ij` is a strong coupling of row `i`
    pub fn is_strong(&self, i: usize, j: usize) -> bool {
        self.dependencies[i].binary_search(&j).is_ok()
    }

    /// Whether `i` has no strong couplings in either direction
    pub fn is_isolated(&self, i: usize) -> bool {
        self.dependencies[i].is_empty() && self.influences[i].is_empty()
    }

    /// Symmetrised neighbourhood `S_i ∪ S_i^T`, sorted
    pub fn neighbourhood(&self, i: usize) -> Vec<usize> {
        let (a, b) = (&self.dependencies[i], &self.influences[i]);
        let mut merged = Vec::with_capacity(a.len() + b.len());
        let (mut p, mut q) = (0, 0);
        while p < a.len() || q < b.len() {
            let next = match (a.get(p), b.get(q)) {
                (Some(&x), Some(&y)) if x == y => {
                    p += 1;
                    q += 1;
                    x
                }
                (Some(&x), Some(&y)) if x < y => {
                    p += 1;
                    x
                }
                (Some(&x), None) => {
                    p += 1;
                    x
                }
                (_, Some(&y)) => {
                    q += 1;
                    y
                }
                (None, None) => unreachable!(),
            };
            merged.push(next);
        }
        merged
    }
}

#[inline]
fn magnitude<T: ComplexField>(v: T) -> f64 {
    v.norm().to_f64().unwrap_or(0.0)
}
