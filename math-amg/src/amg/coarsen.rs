//! Coarse/fine splitting
//!
//! Two drivers share the strength graph:
//!
//! - **Ruge–Stüben**: greedy selection of the point with the most undecided
//!   strong influences, kept in a [`BucketQueue`] and re-bucketed as its
//!   neighbours are decided, followed by a second pass that repairs F–F
//!   strong couplings without a common coarse point.
//! - **Vanek**: aggregation in three passes over the symmetrised strong
//!   neighbourhoods; every aggregate has one root which becomes the coarse
//!   point.

use super::nodes::{BucketQueue, NodeList, PointState};
use super::strength::StrengthGraph;
use crate::sparse::CsrMatrix;
use crate::traits::ComplexField;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Coarsening algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Coarsening {
    /// Classical Ruge–Stüben C/F splitting
    #[default]
    RugeStuben,

    /// Vanek aggregation (for smoothed aggregation interpolation)
    Vanek,
}

/// Result of coarsening a level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splitting {
    states: Vec<PointState>,
    /// Root point of each point's aggregate (aggregation only)
    aggregates: Option<Vec<Option<usize>>>,
}

impl Splitting {
    /// Splitting from explicit states (no aggregates)
    pub fn from_states(states: Vec<PointState>) -> Self {
        Self {
            states,
            aggregates: None,
        }
    }

    /// Number of fine-level points
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn state(&self, i: usize) -> PointState {
        self.states[i]
    }

    pub fn states(&self) -> &[PointState] {
        &self.states
    }

    pub fn is_coarse(&self, i: usize) -> bool {
        self.states[i] == PointState::Coarse
    }

    pub fn num_coarse(&self) -> usize {
        self.states
            .iter()
            .filter(|&&s| s == PointState::Coarse)
            .count()
    }

    pub fn num_fine(&self) -> usize {
        self.states.iter().filter(|&&s| s == PointState::Fine).count()
    }

    /// Coarse points in ascending fine index order
    pub fn coarse_points(&self) -> Vec<usize> {
        (0..self.states.len()).filter(|&i| self.is_coarse(i)).collect()
    }

    /// Aggregate roots, `None` for a C/F splitting
    pub fn aggregates(&self) -> Option<&[Option<usize>]> {
        self.aggregates.as_deref()
    }
}

/// Split the points of `matrix` into coarse and fine points
///
/// The matrix is only consulted by the aggregation driver, which attaches
/// leftover points to their strongest neighbour.
pub fn coarsen<T: ComplexField>(
    matrix: &CsrMatrix<T>,
    strength: &StrengthGraph,
    method: Coarsening,
) -> Splitting {
    assert_eq!(
        matrix.num_rows,
        strength.num_rows(),
        "strength graph does not match matrix"
    );
    match method {
        Coarsening::RugeStuben => ruge_stuben(strength),
        Coarsening::Vanek => vanek_aggregation(matrix, strength),
    }
}

/// Ruge–Stüben coarsening (first pass with bucket queue, second pass repair)
pub fn ruge_stuben(strength: &StrengthGraph) -> Splitting {
    let n = strength.num_rows();
    let mut nodes = NodeList::build(strength);

    let order: Vec<usize> = nodes.iter().collect();
    let max_lambda = order.iter().map(|&i| nodes.node(i).lambda).max().unwrap_or(0);
    let mut queue = BucketQueue::new(n, max_lambda);

    let mut num_isolated = 0;
    for &i in &order {
        if strength.is_isolated(i) {
            nodes.set_state(i, PointState::Fine);
            num_isolated += 1;
        } else {
            queue.insert(i, nodes.node(i).lambda);
        }
    }

    // first pass
    while let Some((i, key)) = queue.pop_max() {
        nodes.node_mut(i).lambda = key;
        if key == 0 && strength.dependencies(i).is_empty() {
            nodes.set_state(i, PointState::Fine);
            continue;
        }
        nodes.set_state(i, PointState::Coarse);

        for &j in strength.influences(i) {
            if nodes.state(j) != PointState::Undecided {
                continue;
            }
            nodes.set_state(j, PointState::Fine);
            queue.remove(j);
            for &k in strength.dependencies(j) {
                if nodes.state(k) == PointState::Undecided {
                    queue.increment(k);
                    nodes.node_mut(k).lambda += 1;
                }
            }
        }

        for &k in strength.dependencies(i) {
            if nodes.state(k) == PointState::Undecided {
                queue.decrement(k);
                let node = nodes.node_mut(k);
                node.lambda = node.lambda.saturating_sub(1);
            }
        }
    }

    let first_pass_coarse = nodes.count(PointState::Coarse);

    // second pass
    let mut promoted = 0;
    for &i in &order {
        if nodes.state(i) != PointState::Fine || strength.dependencies(i).is_empty() {
            continue;
        }

        let mut tentative: Option<usize> = None;
        for &j in strength.dependencies(i) {
            if nodes.state(j) != PointState::Fine || shares_coarse(&nodes, strength, i, j) {
                continue;
            }
            match tentative {
                None => {
                    nodes.set_state(j, PointState::Coarse);
                    tentative = Some(j);
                }
                Some(t) => {
                    nodes.set_state(t, PointState::Fine);
                    nodes.set_state(i, PointState::Coarse);
                    tentative = None;
                    promoted += 1;
                    break;
                }
            }
        }
        if let Some(t) = tentative {
            nodes.node_mut(t).tested = true;
            promoted += 1;
        }
        nodes.node_mut(i).tested = true;

        if nodes.state(i) == PointState::Fine
            && !strength
                .dependencies(i)
                .iter()
                .any(|&c| nodes.state(c) == PointState::Coarse)
        {
            nodes.set_state(i, PointState::Coarse);
            promoted += 1;
        }
    }

    log::debug!(
        "Ruge-Stüben: {} points, {} isolated, {} coarse after pass 1, {} promoted in pass 2",
        n,
        num_isolated,
        first_pass_coarse,
        promoted
    );

    Splitting::from_states(nodes.states())
}

/// Whether fine points `i` and `j` have a common strong coarse dependency
fn shares_coarse(nodes: &NodeList, strength: &StrengthGraph, i: usize, j: usize) -> bool {
    strength.dependencies(i).iter().any(|&c| {
        nodes.state(c) == PointState::Coarse && strength.is_strong(j, c)
    })
}

/// Vanek aggregation in three passes
pub fn vanek_aggregation<T: ComplexField>(
    matrix: &CsrMatrix<T>,
    strength: &StrengthGraph,
) -> Splitting {
    let n = strength.num_rows();
    let mut states = vec![PointState::Undecided; n];
    let mut aggregates: Vec<Option<usize>> = vec![None; n];
    let neighbourhoods: Vec<Vec<usize>> = (0..n).map(|i| strength.neighbourhood(i)).collect();

    for i in 0..n {
        if neighbourhoods[i].is_empty() {
            states[i] = PointState::Fine;
        }
    }

    // pass 1: root plus a fully unaggregated neighbourhood
    for i in 0..n {
        if states[i] != PointState::Undecided || aggregates[i].is_some() {
            continue;
        }
        if neighbourhoods[i].iter().all(|&j| aggregates[j].is_none()) {
            aggregates[i] = Some(i);
            states[i] = PointState::Coarse;
            for &j in &neighbourhoods[i] {
                aggregates[j] = Some(i);
                states[j] = PointState::Fine;
            }
        }
    }
    let pass1_aggregates = states
        .iter()
        .filter(|&&s| s == PointState::Coarse)
        .count();

    // pass 2: join the aggregate of the strongest aggregated neighbour
    let joins: Vec<(usize, usize)> = (0..n)
        .filter(|&i| states[i] == PointState::Undecided)
        .filter_map(|i| {
            neighbourhoods[i]
                .iter()
                .filter_map(|&j| aggregates[j].map(|root| (j, root)))
                .map(|(j, root)| (coupling(matrix, i, j), root))
                .max_by(|a, b| a.0.total_cmp(&b.0))
                .map(|(_, root)| (i, root))
        })
        .collect();
    for &(i, root) in &joins {
        aggregates[i] = Some(root);
        states[i] = PointState::Fine;
    }

    // pass 3: leftovers start new aggregates
    let mut pass3_aggregates = 0;
    for i in 0..n {
        if states[i] != PointState::Undecided {
            continue;
        }
        aggregates[i] = Some(i);
        states[i] = PointState::Coarse;
        pass3_aggregates += 1;
        for &j in &neighbourhoods[i] {
            if aggregates[j].is_none() {
                aggregates[j] = Some(i);
                states[j] = PointState::Fine;
            }
        }
    }

    log::debug!(
        "Vanek aggregation: {} points, {} aggregates in pass 1, {} joined in pass 2, {} new in pass 3",
        n,
        pass1_aggregates,
        joins.len(),
        pass3_aggregates
    );

    Splitting {
        states,
        aggregates: Some(aggregates),
    }
}

/// Symmetric coupling magnitude `max(|a_ij|, |a_ji|)`
fn coupling<T: ComplexField>(matrix: &CsrMatrix<T>, i: usize, j: usize) -> f64 {
    let a = matrix.get(i, j).norm().to_f64().unwrap_or(0.0);
    let b = matrix.get(j, i).norm().to_f64().unwrap_or(0.0);
    a.max(b)
}
