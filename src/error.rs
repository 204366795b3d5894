// src/error.rs

use thiserror::Error;

/// Errors produced while fitting, applying or persisting a PCA model.
#[derive(Error, Debug)]
pub enum PcaError {
    #[error("Cannot scale the dataset: standard deviation is zero at column index {column}")]
    DegenerateInput { column: usize },

    #[error("unknown method: {0}")]
    UnknownMethod(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("Dimension mismatch in {context}: expected {expected}, found {found}")]
    DimensionMismatch {
        expected: usize,
        found: usize,
        context: &'static str,
    },

    #[error("Requested {requested} components, but only {available} are available")]
    InvalidComponentCount { requested: usize, available: usize },

    #[error("Input matrix must have at least 2 samples, found {0}")]
    InsufficientSamples(usize),

    #[error("Input matrix has zero samples or zero features")]
    EmptyInput,

    #[error("Covariance matrix must be square, found {rows}x{columns}")]
    NotSquare { rows: usize, columns: usize },

    #[error("Decomposition failed: {0}")]
    Decomposition(String),

    #[error("Failed to read or write model file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to (de)serialize JSON model record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to serialize PCA model: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("Failed to deserialize PCA model: {0}")]
    Decode(#[from] bincode::error::DecodeError),
}
