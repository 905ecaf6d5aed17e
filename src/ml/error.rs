use std::path::PathBuf;

use thiserror::Error;

use crate::dataset::UnsupportedValue;

/// Errors raised while fitting, validating, or persisting models.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Empty training set")]
    EmptyTrainingSet,
    #[error("Mismatched training inputs/labels: {rows} rows, {labels} labels")]
    LengthMismatch { rows: usize, labels: usize },
    #[error("Row {row} has {found} features (expected {expected})")]
    InconsistentRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Training labels contain a single class")]
    SingleClass,
    #[error("Invalid model: {0}")]
    Invalid(String),
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
    #[error("Invalid model JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Transform(#[from] PredictError),
}

/// Errors raised while turning a record into features or a probability.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PredictError {
    #[error("columns are missing: {column}")]
    MissingColumn { column: String },
    #[error("could not convert {value:?} to a number for column {column}")]
    NotNumeric { column: String, value: String },
    #[error(transparent)]
    Unsupported(#[from] UnsupportedValue),
    #[error("feature vector has {found} values (expected {expected})")]
    FeatureLength { expected: usize, found: usize },
    #[error("model produced a non-finite probability")]
    NonFinite,
}
