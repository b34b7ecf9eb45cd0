//! Error types for the multigrid toolkit.
//!
//! Library errors use `thiserror`, with helper methods for error
//! categorization in the same style as the other math crates.

use thiserror::Error;

/// Errors that can occur while building or applying multigrid components.
#[derive(Debug, Error)]
pub enum AmgError {
    /// A vector or matrix has the wrong size.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension provided
        got: usize,
    },

    /// The operation needs a square matrix.
    #[error("matrix must be square, got {rows}x{cols}")]
    NotSquare {
        /// Number of rows
        rows: usize,
        /// Number of columns
        cols: usize,
    },

    /// A diagonal entry needed for scaling is zero.
    #[error("zero diagonal entry in row {row}")]
    ZeroDiagonal {
        /// Offending row
        row: usize,
    },

    /// Matrix is singular or nearly singular.
    #[error("matrix is singular or nearly singular")]
    SingularMatrix,

    /// A configuration value is out of range.
    #[error("invalid parameter {name} = {value}: {reason}")]
    InvalidParameter {
        /// Parameter name
        name: &'static str,
        /// The rejected value
        value: f64,
        /// Why it was rejected
        reason: &'static str,
    },

    /// Nothing to build a hierarchy from.
    #[error("cannot build a multigrid hierarchy from an empty matrix")]
    EmptyHierarchy,

    /// IO failure while reading or writing files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed input file.
    #[error("parse error at line {line}: {message}")]
    Parse {
        /// 1-based line number
        line: usize,
        /// What went wrong
        message: String,
    },

    /// File extension not recognised.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Serialization failure.
    #[error("serialize error: {0}")]
    Serialize(String),
}

/// A specialized `Result` type for multigrid operations.
pub type Result<T> = std::result::Result<T, AmgError>;

impl AmgError {
    /// Returns `true` if this is a size/shape error.
    pub fn is_dimension_error(&self) -> bool {
        matches!(
            self,
            AmgError::DimensionMismatch { .. } | AmgError::NotSquare { .. }
        )
    }

    /// Returns `true` if this is a configuration error.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            AmgError::InvalidParameter { .. } | AmgError::UnsupportedFormat(_)
        )
    }

    /// Returns `true` if this is a numerical breakdown.
    pub fn is_numerical_error(&self) -> bool {
        matches!(
            self,
            AmgError::ZeroDiagonal { .. } | AmgError::SingularMatrix | AmgError::EmptyHierarchy
        )
    }

    /// Returns `true` if this error came from file handling.
    pub fn is_io_error(&self) -> bool {
        matches!(
            self,
            AmgError::Io(_) | AmgError::Parse { .. } | AmgError::Serialize(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AmgError::DimensionMismatch {
            expected: 10,
            got: 4,
        };
        assert_eq!(err.to_string(), "dimension mismatch: expected 10, got 4");

        let err = AmgError::InvalidParameter {
            name: "theta",
            value: 1.5,
            reason: "must lie in [0, 1]",
        };
        assert_eq!(
            err.to_string(),
            "invalid parameter theta = 1.5: must lie in [0, 1]"
        );
    }

    #[test]
    fn test_categories() {
        assert!(AmgError::NotSquare { rows: 2, cols: 3 }.is_dimension_error());
        assert!(!AmgError::SingularMatrix.is_dimension_error());

        assert!(AmgError::SingularMatrix.is_numerical_error());
        assert!(AmgError::ZeroDiagonal { row: 3 }.is_numerical_error());

        assert!(AmgError::UnsupportedFormat("yaml".into()).is_config_error());

        let parse = AmgError::Parse {
            line: 3,
            message: "bad entry".into(),
        };
        assert!(parse.is_io_error());
        assert!(!parse.is_config_error());
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.mtx");
        let err: AmgError = io.into();
        assert!(err.is_io_error());
        assert!(err.to_string().contains("missing.mtx"));
    }
}
