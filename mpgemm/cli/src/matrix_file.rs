//! Plain-text matrix files: first line `rows cols`, then one whitespace-separated
//! row per line.

use std::fmt::Display;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

/// A matrix loaded from disk, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixFile<T> {
    pub rows: usize,
    pub cols: usize,
    pub values: Vec<T>,
}

pub fn read_matrix<T>(path: &Path) -> Result<MatrixFile<T>>
where
    T: FromStr,
    T::Err: Display,
{
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read matrix file: {}", path.display()))?;
    parse_matrix(&text).with_context(|| format!("Malformed matrix file: {}", path.display()))
}

pub fn parse_matrix<T>(text: &str) -> Result<MatrixFile<T>>
where
    T: FromStr,
    T::Err: Display,
{
    let mut tokens = text.split_whitespace();
    let mut header = |what: &str| -> Result<usize> {
        let tok = tokens.next().with_context(|| format!("missing {} in header", what))?;
        tok.parse::<usize>()
            .with_context(|| format!("invalid {} '{}' in header", what, tok))
    };
    let rows = header("rows")?;
    let cols = header("cols")?;

    let values = tokens
        .enumerate()
        .map(|(idx, tok)| {
            tok.parse::<T>()
                .map_err(|e| anyhow::anyhow!("value {} ('{}'): {}", idx, tok, e))
        })
        .collect::<Result<Vec<T>>>()?;
    if values.len() != rows * cols {
        bail!(
            "header declares {}x{} = {} values, found {}",
            rows,
            cols,
            rows * cols,
            values.len()
        );
    }
    Ok(MatrixFile { rows, cols, values })
}

/// Write a `rows x cols` matrix of consecutive integers starting at `start`.
pub fn write_sequential(path: &Path, rows: usize, cols: usize, start: i64) -> Result<()> {
    let file = fs::File::create(path)
        .with_context(|| format!("Failed to create matrix file: {}", path.display()))?;
    let mut out = BufWriter::new(file);
    writeln!(out, "{} {}", rows, cols)?;
    for i in 0..rows {
        let row: Vec<String> = (0..cols)
            .map(|j| ((i * cols + j) as i64 + start).to_string())
            .collect();
        writeln!(out, "{}", row.join(" "))?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_matrix() {
        let m: MatrixFile<u8> = parse_matrix("2 3\n1 2 3\n4 5 6\n").unwrap();
        assert_eq!((m.rows, m.cols), (2, 3));
        assert_eq!(m.values, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_parse_matrix_count_mismatch() {
        let err = parse_matrix::<f32>("2 2\n1 2 3\n").unwrap_err();
        assert!(err.to_string().contains("found 3"));
    }

    #[test]
    fn test_parse_matrix_bad_value() {
        assert!(parse_matrix::<u8>("1 2\n1 300\n").is_err());
        assert!(parse_matrix::<u8>("").is_err());
    }

    #[test]
    fn test_write_sequential() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        write_sequential(&path, 2, 3, 5).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "2 3\n5 6 7\n8 9 10\n");
        let m: MatrixFile<f32> = read_matrix(&path).unwrap();
        assert_eq!(m.values[5], 10.0);
    }
}
