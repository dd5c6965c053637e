use ehr_model::NormalizationMethod;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("table must be encoded before normalization, pending columns: {columns:?}")]
    NotEncoded { columns: Vec<String> },
    #[error("unknown normalization method: {0}")]
    UnknownMethod(String),
    #[error("variable {0} is not a numeric variable of the table")]
    NotNumeric(String),
    #[error("{method} cannot be applied to {variable}: {reason}")]
    InvalidData {
        method: NormalizationMethod,
        variable: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, NormalizeError>;
