//! Error types for resource loading

use std::path::PathBuf;

use thiserror::Error;

/// Failure to build or load a level layout
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("failed to access level file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("row {row}: invalid tile token {token:?}")]
    BadToken { row: usize, token: String },
    #[error("row {row}, col {col}: unknown tile code {code}")]
    UnknownCode { row: usize, col: usize, code: u8 },
    #[error("expected a {expected_rows}x{expected_cols} grid, got row {row} with {cols} columns")]
    Dimensions {
        expected_rows: usize,
        expected_cols: usize,
        row: usize,
        cols: usize,
    },
    #[error("expected {expected} rows, got {actual}")]
    RowCount { expected: usize, actual: usize },
    #[error("no balance configured for level {0}")]
    NoTuning(u32),
}

/// Failure to read or write the player profile file
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("failed to access profile file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: expected {expected} fields, got {actual}")]
    FieldCount {
        line: usize,
        expected: usize,
        actual: usize,
    },
    #[error("line {line}: field `{field}` is not a number: {value:?}")]
    BadNumber {
        line: usize,
        field: &'static str,
        value: String,
    },
    #[error("username may not contain a comma or newline: {0:?}")]
    InvalidName(String),
}

/// Failure to start a match
#[derive(Debug, Error)]
pub enum StartError {
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error("failed to spawn match thread: {0}")]
    Spawn(#[from] std::io::Error),
}
