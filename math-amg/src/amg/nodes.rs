//! Coarsening nodes and the bucket queue
//!
//! Every unknown is wrapped in a [`CoarseningNode`] carrying its coarse/fine
//! state, a tested flag for the second Ruge–Stüben pass and its influence
//! count `lambda`. Nodes live in an arena and are threaded through an
//! index-linked doubly linked list ([`NodeList`]); the bucket queue links
//! the same indices by `lambda` so that the node with the most strong
//! influences can be found and re-bucketed in O(1).

use super::strength::StrengthGraph;
use serde::{Deserialize, Serialize};

/// Coarse/fine classification of a point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PointState {
    /// Not classified yet
    #[default]
    Undecided,
    /// Kept on the coarse grid
    Coarse,
    /// Interpolated from coarse points
    Fine,
}

/// Auxiliary node wrapping one unknown during coarsening
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoarseningNode {
    /// Row/unknown index in the fine matrix
    pub vector: usize,
    /// Current classification
    pub state: PointState,
    /// Set once the second pass has checked this point
    pub tested: bool,
    /// Influence count, the bucket key
    pub lambda: usize,
}

/// Arena of coarsening nodes threaded through a doubly linked list
#[derive(Debug, Clone)]
pub struct NodeList {
    nodes: Vec<CoarseningNode>,
    prev: Vec<Option<usize>>,
    next: Vec<Option<usize>>,
    linked: Vec<bool>,
    first: Option<usize>,
    last: Option<usize>,
    len: usize,
}

impl NodeList {
    /// Wrap every row of the strength graph, linked in row order, with
    /// `lambda_i = |S_i^T|`
    pub fn build(strength: &StrengthGraph) -> Self {
        let n = strength.num_rows();
        let nodes = (0..n)
            .map(|i| CoarseningNode {
                vector: i,
                state: PointState::Undecided,
                tested: false,
                lambda: strength.influences(i).len(),
            })
            .collect();

        let mut list = Self {
            nodes,
            prev: vec![None; n],
            next: vec![None; n],
            linked: vec![false; n],
            first: None,
            last: None,
            len: 0,
        };
        for i in 0..n {
            list.push_back(i);
        }
        list
    }

    /// Number of linked nodes
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if no node is linked
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total number of nodes in the arena, linked or not
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    /// First linked node
    pub fn first(&self) -> Option<usize> {
        self.first
    }

    /// Last linked node
    pub fn last(&self) -> Option<usize> {
        self.last
    }

    /// Successor in list order
    pub fn next(&self, i: usize) -> Option<usize> {
        self.next[i]
    }

    /// Predecessor in list order
    pub fn prev(&self, i: usize) -> Option<usize> {
        self.prev[i]
    }

    pub fn node(&self, i: usize) -> &CoarseningNode {
        &self.nodes[i]
    }

    pub fn node_mut(&mut self, i: usize) -> &mut CoarseningNode {
        &mut self.nodes[i]
    }

    /// Shorthand for `node(i).state`
    pub fn state(&self, i: usize) -> PointState {
        self.nodes[i].state
    }

    pub fn set_state(&mut self, i: usize, state: PointState) {
        self.nodes[i].state = state;
    }

    /// Whether node `i` is currently linked
    pub fn is_linked(&self, i: usize) -> bool {
        self.linked[i]
    }

    /// Detach node `i` from the list; the node itself stays in the arena
    pub fn unlink(&mut self, i: usize) {
        if !self.linked[i] {
            return;
        }
        match self.prev[i] {
            Some(p) => self.next[p] = self.next[i],
            None => self.first = self.next[i],
        }
        match self.next[i] {
            Some(n) => self.prev[n] = self.prev[i],
            None => self.last = self.prev[i],
        }
        self.prev[i] = None;
        self.next[i] = None;
        self.linked[i] = false;
        self.len -= 1;
    }

    /// Append node `i` at the end of the list (moving it if already linked)
    pub fn push_back(&mut self, i: usize) {
        self.unlink(i);
        self.prev[i] = self.last;
        match self.last {
            Some(l) => self.next[l] = Some(i),
            None => self.first = Some(i),
        }
        self.last = Some(i);
        self.linked[i] = true;
        self.len += 1;
    }

    /// Linked node indices in list order
    pub fn iter(&self) -> NodeIter<'_> {
        NodeIter {
            list: self,
            cursor: self.first,
        }
    }

    /// Number of nodes (linked or not) in the given state
    pub fn count(&self, state: PointState) -> usize {
        self.nodes.iter().filter(|n| n.state == state).count()
    }

    /// Final per-point states
    pub fn states(&self) -> Vec<PointState> {
        self.nodes.iter().map(|n| n.state).collect()
    }
}

/// Iterator over a [`NodeList`] in list order
pub struct NodeIter<'a> {
    list: &'a NodeList,
    cursor: Option<usize>,
}

impl Iterator for NodeIter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let current = self.cursor?;
        self.cursor = self.list.next[current];
        Some(current)
    }
}

/// Priority structure keyed by influence count
///
/// Each key owns an index-linked bucket. Inserting pushes at the bucket
/// head, so among equal keys the most recently (re-)bucketed node is
/// popped first.
#[derive(Debug, Clone)]
pub struct BucketQueue {
    heads: Vec<Option<usize>>,
    prev: Vec<Option<usize>>,
    next: Vec<Option<usize>>,
    keys: Vec<Option<usize>>,
    /// Upper bound on the highest non-empty bucket
    top: usize,
    len: usize,
}

impl BucketQueue {
    /// Empty queue for `capacity` items with keys initially up to `max_key`
    pub fn new(capacity: usize, max_key: usize) -> Self {
        Self {
            heads: vec![None; max_key + 1],
            prev: vec![None; capacity],
            next: vec![None; capacity],
            keys: vec![None; capacity],
            top: 0,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, i: usize) -> bool {
        self.keys[i].is_some()
    }

    /// Current key of `i`, `None` if not queued
    pub fn key(&self, i: usize) -> Option<usize> {
        self.keys[i]
    }

    /// Queue `i` under `key`, replacing any previous key
    pub fn insert(&mut self, i: usize, key: usize) {
        self.remove(i);
        if key >= self.heads.len() {
            self.heads.resize(key + 1, None);
        }
        self.prev[i] = None;
        self.next[i] = self.heads[key];
        if let Some(h) = self.heads[key] {
            self.prev[h] = Some(i);
        }
        self.heads[key] = Some(i);
        self.keys[i] = Some(key);
        self.top = self.top.max(key);
        self.len += 1;
    }

    /// Dequeue `i`; returns its key if it was queued
    pub fn remove(&mut self, i: usize) -> Option<usize> {
        let key = self.keys[i]?;
        match self.prev[i] {
            Some(p) => self.next[p] = self.next[i],
            None => self.heads[key] = self.next[i],
        }
        if let Some(n) = self.next[i] {
            self.prev[n] = self.prev[i];
        }
        self.prev[i] = None;
        self.next[i] = None;
        self.keys[i] = None;
        self.len -= 1;
        Some(key)
    }

    /// Move `i` one bucket up; no-op if not queued
    pub fn increment(&mut self, i: usize) {
        if let Some(key) = self.keys[i] {
            self.insert(i, key + 1);
        }
    }

    /// Move `i` one bucket down (saturating at zero); no-op if not queued
    pub fn decrement(&mut self, i: usize) {
        if let Some(key) = self.keys[i] {
            self.insert(i, key.saturating_sub(1));
        }
    }

    /// Highest occupied key
    pub fn max_key(&mut self) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        while self.heads[self.top].is_none() {
            self.top -= 1;
        }
        Some(self.top)
    }

    /// Remove and return the head of the highest occupied bucket
    pub fn pop_max(&mut self) -> Option<(usize, usize)> {
        let key = self.max_key()?;
        let i = self.heads[key]?;
        self.remove(i);
        Some((i, key))
    }
}
