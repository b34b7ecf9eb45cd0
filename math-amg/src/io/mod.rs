//! File input/output
//!
//! - [`matrix_market`]: sparse matrices in Matrix Market coordinate format

pub mod matrix_market;

pub use matrix_market::{parse_matrix_market, read_matrix_market, write_matrix_market};
