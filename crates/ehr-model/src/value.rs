//! Cell values of an annotated table.

use std::fmt;

use ehr_common::format_numeric;
use serde::{Deserialize, Serialize};

/// A single cell of the data matrix.
///
/// Before encoding a column may hold text; afterwards every cell is either a
/// number or missing. `NaN` is never stored as a number: the constructors fold
/// it into [`Value::Missing`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Missing,
    Number(f64),
    Text(String),
}

impl Value {
    /// Builds a numeric cell, mapping `NaN` to `Missing`.
    pub fn number(v: f64) -> Self {
        if v.is_nan() {
            Value::Missing
        } else {
            Value::Number(v)
        }
    }

    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn is_missing(&self) -> bool {
        match self {
            Value::Missing => true,
            Value::Number(v) => v.is_nan(),
            Value::Text(_) => false,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Value::Text(_))
    }

    /// Numeric content, `None` for missing and text cells.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(v) if !v.is_nan() => Some(*v),
            _ => None,
        }
    }

    /// Numeric content with missing cells as `NaN`, `None` for text.
    pub fn to_f64_or_nan(&self) -> Option<f64> {
        match self {
            Value::Missing => Some(f64::NAN),
            Value::Number(v) => Some(*v),
            Value::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::number(v)
    }
}

impl From<Option<f64>> for Value {
    fn from(v: Option<f64>) -> Self {
        v.map_or(Value::Missing, Value::number)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => Ok(()),
            Value::Number(v) => f.write_str(&format_numeric(*v)),
            Value::Text(s) => f.write_str(s),
        }
    }
}
