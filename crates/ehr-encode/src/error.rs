use ehr_model::ModelError;
use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("invalid encode input: {0}")]
    InvalidInput(String),
    #[error("unknown encoding mode: {0}")]
    UnknownEncoding(String),
    #[error("column {0} is assigned to more than one encoding")]
    DuplicateColumn(String),
    #[error("column not found: {0}")]
    ColumnNotFound(String),
    #[error(
        "could not build the encoded table, columns {columns:?} still hold text; \
         ensure every non-numerical column is encoded"
    )]
    Construction { columns: Vec<String> },
    #[error(
        "hash encoding of {group:?} produced {produced} of {expected} components; \
         hash encoding is not suitable for low-cardinality or very small data"
    )]
    HashEncoding {
        group: Vec<String>,
        produced: usize,
        expected: usize,
    },
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),
}

pub type Result<T> = std::result::Result<T, EncodeError>;
