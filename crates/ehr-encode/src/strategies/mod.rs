//! Encoding strategies.
//!
//! Each strategy turns the archived values of one column (or one group of
//! columns for multi-column strategies) into an [`EncodedBlock`] of numeric
//! columns with their variable names.

mod category;
mod count;
mod hash;
mod label;
mod one_hot;

use ehr_model::{ArchivedColumn, ENCODED_PREFIX, EncodingMode, Value};

use crate::error::{EncodeError, Result};

pub(crate) use category::Category;
pub use hash::HASH_COMPONENTS;

/// Numeric columns produced by one strategy application.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedBlock {
    pub columns: Vec<Vec<Value>>,
    pub names: Vec<String>,
}

impl EncodedBlock {
    pub fn width(&self) -> usize {
        self.names.len()
    }
}

/// Encoder selected once per encoding mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    OneHot,
    Label,
    Count,
    Hash { components: usize },
}

impl From<EncodingMode> for Strategy {
    fn from(mode: EncodingMode) -> Self {
        match mode {
            EncodingMode::OneHot => Strategy::OneHot,
            EncodingMode::Label => Strategy::Label,
            EncodingMode::Count => Strategy::Count,
            EncodingMode::Hash => Strategy::Hash {
                components: HASH_COMPONENTS,
            },
        }
    }
}

impl Strategy {
    /// Encodes the given archived columns.
    ///
    /// Single-column strategies expect exactly one input column.
    pub fn encode(&self, inputs: &[&ArchivedColumn]) -> Result<EncodedBlock> {
        match self {
            Strategy::OneHot => single(inputs).map(one_hot::encode),
            Strategy::Label => single(inputs).map(label::encode),
            Strategy::Count => single(inputs).map(count::encode),
            Strategy::Hash { components } => hash::encode(inputs, *components),
        }
    }
}

fn single<'a>(inputs: &[&'a ArchivedColumn]) -> Result<&'a ArchivedColumn> {
    match inputs {
        [input] => Ok(*input),
        _ => Err(EncodeError::InvalidInput(format!(
            "single-column strategies encode one column at a time, got {}",
            inputs.len()
        ))),
    }
}

fn encoded_name(parts: &[&str]) -> String {
    format!("{ENCODED_PREFIX}{}", parts.join("_"))
}
