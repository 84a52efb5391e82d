//! Flat numeric statistics tables
//!
//! A statistics file is a whitespace-separated matrix of floats with no
//! header. Text from a `#` to the end of its line is a comment and blank
//! lines are skipped, matching the `loadtxt` convention the benchmark drivers
//! write against.

use std::fs;
use std::path::Path;
use thiserror::Error;

/// Source label used for tables built in memory
pub const MEMORY_SOURCE: &str = "<memory>";

/// Errors that can occur while loading a statistics table
#[derive(Error, Debug)]
pub enum TableError {
    #[error("Failed to read {source_name}: {error}")]
    Io {
        source_name: String,
        #[source]
        error: std::io::Error,
    },

    #[error("{source_name}:{line}: column {column}: invalid number {token:?}")]
    ParseFloat {
        source_name: String,
        line: usize,
        column: usize,
        token: String,
    },

    #[error("{source_name}:{line}: expected {expected} columns, found {found}")]
    RaggedRow {
        source_name: String,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("{source_name}: table contains no data rows")]
    Empty { source_name: String },

    #[error("{source_name}: {rows}x{cols} table needs {} values, got {actual}", .rows * .cols)]
    ShapeMismatch {
        source_name: String,
        rows: usize,
        cols: usize,
        actual: usize,
    },
}

/// Result type for table loading
pub type Result<T> = std::result::Result<T, TableError>;

/// Immutable row-major matrix loaded verbatim from a statistics file
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    source: String,
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl RawTable {
    /// Build a table from row-major data
    pub fn new(source: impl Into<String>, rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        let source = source.into();
        if rows == 0 || cols == 0 {
            return Err(TableError::Empty { source_name: source });
        }
        if data.len() != rows * cols {
            return Err(TableError::ShapeMismatch {
                source_name: source,
                rows,
                cols,
                actual: data.len(),
            });
        }
        Ok(Self {
            source,
            rows,
            cols,
            data,
        })
    }

    /// Build a table from a list of rows, all of which must share one width
    pub fn from_rows(source: impl Into<String>, rows: &[Vec<f64>]) -> Result<Self> {
        let source = source.into();
        let cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(TableError::RaggedRow {
                    source_name: source,
                    line: i + 1,
                    expected: cols,
                    found: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Self::new(source, rows.len(), cols, data)
    }

    /// Parse whitespace-separated text
    pub fn parse(source: impl Into<String>, text: &str) -> Result<Self> {
        let source = source.into();
        let mut data = Vec::new();
        let mut cols: Option<usize> = None;
        let mut rows = 0;

        for (line_idx, line) in text.lines().enumerate() {
            // everything from the first '#' on is a comment
            let content = line.find('#').map_or(line, |pos| &line[..pos]);
            let trimmed = content.trim();
            if trimmed.is_empty() {
                continue;
            }

            let before = data.len();
            for (col_idx, token) in trimmed.split_whitespace().enumerate() {
                let value = token.parse::<f64>().map_err(|_| TableError::ParseFloat {
                    source_name: source.clone(),
                    line: line_idx + 1,
                    column: col_idx + 1,
                    token: token.to_string(),
                })?;
                data.push(value);
            }

            let found = data.len() - before;
            match cols {
                None => cols = Some(found),
                Some(expected) if expected != found => {
                    return Err(TableError::RaggedRow {
                        source_name: source,
                        line: line_idx + 1,
                        expected,
                        found,
                    });
                }
                Some(_) => {}
            }
            rows += 1;
        }

        Self::new(source, rows, cols.unwrap_or(0), data)
    }

    /// Load and parse a statistics file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let source = path_ref.display().to_string();
        let contents = fs::read_to_string(path_ref).map_err(|error| TableError::Io {
            source_name: source.clone(),
            error,
        })?;

        let table = Self::parse(source, &contents)?;
        tracing::debug!(
            source = table.source(),
            rows = table.rows,
            cols = table.cols,
            "loaded statistics table"
        );
        Ok(table)
    }

    /// File path (or `<memory>`) the table came from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns (the sample axis)
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Value at `(row, col)`, `None` when out of range
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            Some(self.data[row * self.cols + col])
        } else {
            None
        }
    }

    /// Borrow one row
    ///
    /// # Panics
    ///
    /// Panics if `row >= self.rows()`.
    pub fn row(&self, row: usize) -> &[f64] {
        let start = row * self.cols;
        &self.data[start..start + self.cols]
    }
}
