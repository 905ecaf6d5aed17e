use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading, cleaning, or splitting the churn dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Dataset not found at {path}. Place the churn CSV there or set paths.dataset")]
    NotFound { path: PathBuf },
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("CSV has no header row")]
    EmptyFile,
    #[error("Duplicate column {name} in header")]
    DuplicateColumn { name: String },
    #[error("Line {line}: expected {expected} fields, found {found}")]
    RaggedRow {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("Line {line}: unterminated quoted field")]
    UnterminatedQuote { line: usize },
    #[error("{column} column not in dataset")]
    MissingColumn { column: String },
    #[error("Row {row}: target value {value:?} is neither \"Yes\" nor \"No\"")]
    InvalidTarget { row: usize, value: String },
    #[error("Invalid split: {0}")]
    InvalidSplit(String),
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),
}
