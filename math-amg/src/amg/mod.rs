//! Algebraic multigrid setup
//!
//! - [`strength`]: strong-coupling graph
//! - [`nodes`]: coarsening nodes and the bucket queue
//! - [`coarsen`]: Ruge–Stüben splitting and Vanek aggregation
//! - [`grid`]: coarse numbering and injection pattern
//! - [`interpolation`]: prolongation weights, restriction, Galerkin product
//! - [`transfer`]: the multi-level driver

pub mod coarsen;
pub mod grid;
pub mod interpolation;
pub mod nodes;
pub mod strength;
pub mod transfer;

pub use coarsen::{Coarsening, Splitting, coarsen};
pub use grid::CoarseGrid;
pub use interpolation::{Interpolation, InterpolationOptions, galerkin, interpolate, restriction};
pub use nodes::{BucketQueue, CoarseningNode, NodeList, PointState};
pub use strength::{Marking, StrengthGraph};
pub use transfer::{AmgHierarchy, AmgLevel, AmgTransferConfig, StopReason};
