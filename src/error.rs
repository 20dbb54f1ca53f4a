//! Error types for Screenlens

use thiserror::Error;

/// Errors that can occur while loading or analyzing usage data
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Dataset contains no observations")]
    EmptyDataset,

    #[error("Insufficient observations: need at least {required}, got {actual}")]
    InsufficientObservations { required: usize, actual: usize },

    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    #[error("Invalid value at line {line}, column '{column}': {message}")]
    InvalidValue {
        line: u64,
        column: String,
        message: String,
    },

    #[error("Value range too wide: {0}")]
    ValueRange(String),

    #[error("Invalid behavior class: {0}")]
    InvalidBehaviorClass(String),

    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    #[error("Unknown section: {0}")]
    UnknownSection(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Statistical computation failed: {0}")]
    Statistic(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}
