//! Error types for quality-control operations.

use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QcError {
    #[error("layer not found: {0}")]
    LayerNotFound(String),

    #[error("QC variable {0} is not a column of var")]
    QcVariableNotFound(String),

    #[error("QC variable {name} must be a boolean mask over all {expected} variables")]
    InvalidQcVariable { name: String, expected: usize },

    #[error("variable {variable} holds non-numeric values and cannot be summed")]
    NonNumeric { variable: String },

    #[error("no reference measurement matches {measurement} with confidence >= {threshold}")]
    NoReferenceMatch { measurement: String, threshold: f64 },

    #[error("measurement {0} is not a variable of the table")]
    MeasurementNotFound(String),

    #[error("failed to read reference table {source_name}: {message}")]
    ReferenceTable {
        source_name: String,
        message: String,
    },

    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),
}

pub type Result<T> = std::result::Result<T, QcError>;
