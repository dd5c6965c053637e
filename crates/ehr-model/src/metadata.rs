//! Typed table metadata: column classification, encoding history and
//! normalization history.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::value::Value;

/// Reserved prefix carried by every variable produced by an encoder.
pub const ENCODED_PREFIX: &str = "ehrcat_";

/// Returns true when a variable name was produced by an encoder.
pub fn is_encoded_name(name: &str) -> bool {
    name.starts_with(ENCODED_PREFIX)
}

/// Categorical encoding strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EncodingMode {
    #[serde(rename = "one_hot_encoding")]
    OneHot,
    #[serde(rename = "label_encoding")]
    Label,
    #[serde(rename = "count_encoding")]
    Count,
    #[serde(rename = "hash_encoding")]
    Hash,
}

impl EncodingMode {
    pub const ALL: [EncodingMode; 4] = [
        EncodingMode::OneHot,
        EncodingMode::Label,
        EncodingMode::Count,
        EncodingMode::Hash,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EncodingMode::OneHot => "one_hot_encoding",
            EncodingMode::Label => "label_encoding",
            EncodingMode::Count => "count_encoding",
            EncodingMode::Hash => "hash_encoding",
        }
    }

    /// Multi-column strategies consume groups of columns at once.
    pub fn is_multi_column(self) -> bool {
        matches!(self, EncodingMode::Hash)
    }
}

impl fmt::Display for EncodingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EncodingMode {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| ModelError::UnknownEncodingMode(s.to_string()))
    }
}

/// Normalization methods applied to numeric variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NormalizationMethod {
    #[serde(rename = "scale")]
    Scale,
    #[serde(rename = "minmax")]
    MinMax,
    #[serde(rename = "maxabs")]
    MaxAbs,
    #[serde(rename = "robust_scale")]
    RobustScale,
    #[serde(rename = "quantile_uniform")]
    QuantileUniform,
    #[serde(rename = "quantile_normal")]
    QuantileNormal,
    #[serde(rename = "power_yeo_johnson")]
    PowerYeoJohnson,
    #[serde(rename = "power_box_cox")]
    PowerBoxCox,
    #[serde(rename = "identity")]
    Identity,
}

impl NormalizationMethod {
    pub const ALL: [NormalizationMethod; 9] = [
        NormalizationMethod::Scale,
        NormalizationMethod::MinMax,
        NormalizationMethod::MaxAbs,
        NormalizationMethod::RobustScale,
        NormalizationMethod::QuantileUniform,
        NormalizationMethod::QuantileNormal,
        NormalizationMethod::PowerYeoJohnson,
        NormalizationMethod::PowerBoxCox,
        NormalizationMethod::Identity,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NormalizationMethod::Scale => "scale",
            NormalizationMethod::MinMax => "minmax",
            NormalizationMethod::MaxAbs => "maxabs",
            NormalizationMethod::RobustScale => "robust_scale",
            NormalizationMethod::QuantileUniform => "quantile_uniform",
            NormalizationMethod::QuantileNormal => "quantile_normal",
            NormalizationMethod::PowerYeoJohnson => "power_yeo_johnson",
            NormalizationMethod::PowerBoxCox => "power_box_cox",
            NormalizationMethod::Identity => "identity",
        }
    }
}

impl fmt::Display for NormalizationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NormalizationMethod {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| ModelError::UnknownNormalizationMethod(s.to_string()))
    }
}

/// A column, or a group of columns for multi-column strategies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnSelection {
    Single(String),
    Group(Vec<String>),
}

impl ColumnSelection {
    pub fn group<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ColumnSelection::Group(names.into_iter().map(Into::into).collect())
    }

    /// Column names covered by this selection, in order.
    pub fn names(&self) -> &[String] {
        match self {
            ColumnSelection::Single(name) => std::slice::from_ref(name),
            ColumnSelection::Group(names) => names,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.names().is_empty()
    }
}

impl From<&str> for ColumnSelection {
    fn from(name: &str) -> Self {
        ColumnSelection::Single(name.to_string())
    }
}

impl From<String> for ColumnSelection {
    fn from(name: String) -> Self {
        ColumnSelection::Single(name)
    }
}

/// Pre-encoding values of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchivedColumn {
    pub name: String,
    pub values: Vec<Value>,
}

/// Reversible record of every categorical encoding applied to a table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncodingHistory {
    /// Originals in the order they were first archived. Entries are never
    /// removed while the table stays encoded.
    pub original_values: Vec<ArchivedColumn>,
    pub var_to_encoding: BTreeMap<String, EncodingMode>,
    pub encoding_to_var: BTreeMap<EncodingMode, Vec<ColumnSelection>>,
    /// Columns that encoding copied into `obs`; decoding removes only these.
    #[serde(default)]
    pub obs_columns: Vec<String>,
}

impl EncodingHistory {
    pub fn archived(&self, name: &str) -> Option<&ArchivedColumn> {
        self.original_values.iter().find(|col| col.name == name)
    }

    /// Archives a column unless it is already present.
    ///
    /// Returns `true` when a new entry was added.
    pub fn archive(&mut self, name: &str, values: Vec<Value>) -> bool {
        if self.archived(name).is_some() {
            return false;
        }
        self.original_values.push(ArchivedColumn {
            name: name.to_string(),
            values,
        });
        true
    }

    pub fn archived_names(&self) -> impl Iterator<Item = &str> {
        self.original_values.iter().map(|col| col.name.as_str())
    }

    pub fn mode_of(&self, name: &str) -> Option<EncodingMode> {
        self.var_to_encoding.get(name).copied()
    }

    /// Records one selection under `mode`, updating both directions.
    pub fn record(&mut self, mode: EncodingMode, selection: ColumnSelection) {
        for name in selection.names() {
            self.var_to_encoding.insert(name.clone(), mode);
        }
        self.encoding_to_var.entry(mode).or_default().push(selection);
    }
}

/// Metadata attached to an annotated table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableMetadata {
    pub numerical_columns: Vec<String>,
    pub non_numerical_columns: Vec<String>,
    /// `None` until the table is encoded for the first time.
    pub encoding: Option<EncodingHistory>,
    pub normalization: BTreeMap<String, Vec<NormalizationMethod>>,
}

impl TableMetadata {
    pub fn is_numerical(&self, name: &str) -> bool {
        self.numerical_columns.iter().any(|n| n == name)
    }

    pub fn is_non_numerical(&self, name: &str) -> bool {
        self.non_numerical_columns.iter().any(|n| n == name)
    }

    /// Drops `name` from both classification lists.
    pub fn unclassify(&mut self, name: &str) {
        self.numerical_columns.retain(|n| n != name);
        self.non_numerical_columns.retain(|n| n != name);
    }
}
