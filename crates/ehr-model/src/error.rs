use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("{what} has {found} entries, expected {expected}")]
    ShapeMismatch {
        what: String,
        expected: usize,
        found: usize,
    },
    #[error("duplicate variable name: {0}")]
    DuplicateVariable(String),
    #[error("layer {layer} has shape {found:?}, expected {expected:?}")]
    LayerShape {
        layer: String,
        expected: (usize, usize),
        found: (usize, usize),
    },
    #[error("variable not found: {0}")]
    VariableNotFound(String),
    #[error("unknown encoding mode: {0}")]
    UnknownEncodingMode(String),
    #[error("unknown normalization method: {0}")]
    UnknownNormalizationMethod(String),
    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),
}

pub type Result<T> = std::result::Result<T, ModelError>;
