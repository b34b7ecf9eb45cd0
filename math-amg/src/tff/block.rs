//! Block-vector tree over a tensor grid
//!
//! Unknowns are numbered lexicographically with x fastest. A node of
//! dimension `d` covers a contiguous index range and has `n_{d-1}` children
//! of dimension `d-1`: a volume splits into planes, a plane into lines.
//! Lines are the leaves.

use crate::error::{AmgError, Result};
use std::ops::Range;

/// One node of the block tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockVector {
    offset: usize,
    dims: Vec<usize>,
    children: Vec<BlockVector>,
}

impl BlockVector {
    /// Build the tree for a grid of the given extents `[n_x, n_y, ...]`
    pub fn from_dims(dims: &[usize]) -> Result<Self> {
        if dims.is_empty() {
            return Err(AmgError::InvalidParameter {
                name: "dims",
                value: 0.0,
                reason: "at least one grid dimension is required",
            });
        }
        if let Some(&bad) = dims.iter().find(|&&d| d == 0) {
            return Err(AmgError::InvalidParameter {
                name: "dims",
                value: bad as f64,
                reason: "grid extents must be positive",
            });
        }
        Ok(Self::build(0, dims))
    }

    fn build(offset: usize, dims: &[usize]) -> Self {
        let children = match dims.split_last() {
            Some((&outer, inner)) if !inner.is_empty() => {
                let stride: usize = inner.iter().product();
                (0..outer)
                    .map(|k| Self::build(offset + k * stride, inner))
                    .collect()
            }
            _ => Vec::new(),
        };
        Self {
            offset,
            dims: dims.to_vec(),
            children,
        }
    }

    /// First global index covered by this node
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of unknowns covered
    pub fn len(&self) -> usize {
        self.dims.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Global index range
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.len()
    }

    /// Grid extents of this node, x first
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn children(&self) -> &[BlockVector] {
        &self.children
    }

    /// Leaf test: a line has no children
    pub fn is_line(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of direct children
    pub fn num_blocks(&self) -> usize {
        self.children.len()
    }

    /// Number of lines below (or at) this node
    pub fn num_lines(&self) -> usize {
        if self.is_line() {
            1
        } else {
            self.children.iter().map(BlockVector::num_lines).sum()
        }
    }
}
