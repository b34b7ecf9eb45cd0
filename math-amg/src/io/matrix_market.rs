//! Matrix Market coordinate files
//!
//! Reads `coordinate` matrices with `real`, `integer` or `pattern` fields
//! and `general`, `symmetric` or `skew-symmetric` storage. Pattern entries
//! are read as ones. Writing always produces `coordinate real general`.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::error::{AmgError, Result};
use crate::sparse::CsrMatrix;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Real,
    Integer,
    Pattern,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Symmetry {
    General,
    Symmetric,
    SkewSymmetric,
}

fn parse_error(line: usize, message: impl Into<String>) -> AmgError {
    AmgError::Parse {
        line,
        message: message.into(),
    }
}

fn parse_header(header: &str) -> Result<(Field, Symmetry)> {
    let tokens: Vec<String> = header
        .split_whitespace()
        .map(|t| t.to_lowercase())
        .collect();
    if tokens.len() != 5 || tokens[0] != "%%matrixmarket" || tokens[1] != "matrix" {
        return Err(parse_error(1, "missing %%MatrixMarket matrix header"));
    }
    if tokens[2] != "coordinate" {
        return Err(AmgError::UnsupportedFormat(format!(
            "Matrix Market storage '{}'",
            tokens[2]
        )));
    }
    let field = match tokens[3].as_str() {
        "real" | "double" => Field::Real,
        "integer" => Field::Integer,
        "pattern" => Field::Pattern,
        other => {
            return Err(AmgError::UnsupportedFormat(format!(
                "Matrix Market field '{other}'"
            )));
        }
    };
    let symmetry = match tokens[4].as_str() {
        "general" => Symmetry::General,
        "symmetric" => Symmetry::Symmetric,
        "skew-symmetric" => Symmetry::SkewSymmetric,
        other => {
            return Err(AmgError::UnsupportedFormat(format!(
                "Matrix Market symmetry '{other}'"
            )));
        }
    };
    Ok((field, symmetry))
}

fn parse_usize(token: Option<&str>, line: usize, what: &str) -> Result<usize> {
    token
        .ok_or_else(|| parse_error(line, format!("missing {what}")))?
        .parse()
        .map_err(|_| parse_error(line, format!("invalid {what}")))
}

/// Parse Matrix Market text into a CSR matrix
pub fn parse_matrix_market(content: &str) -> Result<CsrMatrix<f64>> {
    let mut lines = content.lines().enumerate().map(|(i, l)| (i + 1, l.trim()));

    let (_, header) = lines
        .next()
        .ok_or_else(|| parse_error(1, "empty file"))?;
    let (field, symmetry) = parse_header(header)?;

    let mut lines = lines.filter(|(_, l)| !l.is_empty() && !l.starts_with('%'));

    let (size_line, size) = lines
        .next()
        .ok_or_else(|| parse_error(1, "missing size line"))?;
    let mut tokens = size.split_whitespace();
    let num_rows = parse_usize(tokens.next(), size_line, "row count")?;
    let num_cols = parse_usize(tokens.next(), size_line, "column count")?;
    let nnz = parse_usize(tokens.next(), size_line, "entry count")?;

    if symmetry != Symmetry::General && num_rows != num_cols {
        return Err(AmgError::NotSquare {
            rows: num_rows,
            cols: num_cols,
        });
    }

    // the declared count is untrusted; the read != nnz check reports it
    let entries = nnz.min(content.lines().count());
    let capacity = if symmetry == Symmetry::General {
        entries
    } else {
        entries.saturating_mul(2)
    };
    let mut triplets = Vec::with_capacity(capacity);
    let mut read = 0;

    for (line_no, line) in lines {
        if read == nnz {
            return Err(parse_error(line_no, "more entries than declared"));
        }
        let mut tokens = line.split_whitespace();
        let row = parse_usize(tokens.next(), line_no, "row index")?;
        let col = parse_usize(tokens.next(), line_no, "column index")?;
        if row == 0 || col == 0 || row > num_rows || col > num_cols {
            return Err(parse_error(
                line_no,
                format!("entry ({row}, {col}) outside {num_rows}x{num_cols}"),
            ));
        }
        let value = match field {
            Field::Pattern => 1.0,
            Field::Real | Field::Integer => tokens
                .next()
                .ok_or_else(|| parse_error(line_no, "missing value"))?
                .parse::<f64>()
                .map_err(|_| parse_error(line_no, "invalid value"))?,
        };

        let (i, j) = (row - 1, col - 1);
        triplets.push((i, j, value));
        if i != j {
            match symmetry {
                Symmetry::General => {}
                Symmetry::Symmetric => triplets.push((j, i, value)),
                Symmetry::SkewSymmetric => triplets.push((j, i, -value)),
            }
        }
        read += 1;
    }

    if read != nnz {
        return Err(parse_error(
            content.lines().count(),
            format!("expected {nnz} entries, found {read}"),
        ));
    }

    log::debug!(
        "Matrix Market: {}x{} with {} stored entries ({:?}, {:?})",
        num_rows,
        num_cols,
        nnz,
        field,
        symmetry
    );

    Ok(CsrMatrix::from_triplets(num_rows, num_cols, triplets))
}

/// Read a Matrix Market file
pub fn read_matrix_market<P: AsRef<Path>>(path: P) -> Result<CsrMatrix<f64>> {
    let content = fs::read_to_string(path)?;
    parse_matrix_market(&content)
}

/// Write a matrix as `coordinate real general`
pub fn write_matrix_market<P: AsRef<Path>>(path: P, matrix: &CsrMatrix<f64>) -> Result<()> {
    let mut out = String::with_capacity(32 * (matrix.nnz() + 2));
    out.push_str("%%MatrixMarket matrix coordinate real general\n");
    // Writing into a String cannot fail
    let _ = writeln!(out, "{} {} {}", matrix.num_rows, matrix.num_cols, matrix.nnz());
    for i in 0..matrix.num_rows {
        for (j, v) in matrix.row_entries(i) {
            let _ = writeln!(out, "{} {} {:.17e}", i + 1, j + 1, v);
        }
    }
    fs::write(path, out)?;
    Ok(())
}
