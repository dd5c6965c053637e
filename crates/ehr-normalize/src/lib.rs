//! Normalization of numeric variables in annotated EHR tables.

pub mod error;
pub mod methods;
pub mod normalize;

pub use error::{NormalizeError, Result};
pub use normalize::{NormalizationSpec, normalize, numeric_variables};
