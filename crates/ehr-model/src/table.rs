//! The annotated table: a data matrix with row and column annotations,
//! aligned layers and typed metadata.

use std::collections::{BTreeMap, BTreeSet};

use ndarray::{Array2, ArrayView1, Axis};
use polars::prelude::DataFrame;

use crate::error::{ModelError, Result};
use crate::metadata::TableMetadata;
use crate::value::Value;

/// Layer holding pre-encoding values.
pub const LAYER_ORIGINAL: &str = "original";
/// Layer holding pre-normalization values.
pub const LAYER_RAW: &str = "raw";

/// Observations x variables matrix with annotations.
///
/// `obs` and `var` are either empty (no columns) or have one row per
/// observation and per variable respectively. Every layer has the shape of
/// `x`.
#[derive(Debug, Clone)]
pub struct AnnotatedTable {
    pub x: Array2<Value>,
    pub obs_names: Vec<String>,
    pub obs: DataFrame,
    pub var_names: Vec<String>,
    pub var: DataFrame,
    pub layers: BTreeMap<String, Array2<Value>>,
    pub uns: TableMetadata,
}

impl AnnotatedTable {
    /// Builds a table with default observation names (`"0"`, `"1"`, ...)
    /// and empty annotations.
    pub fn new(x: Array2<Value>, var_names: Vec<String>) -> Result<Self> {
        let obs_names = (0..x.nrows()).map(|i| i.to_string()).collect();
        Self::with_names(x, obs_names, var_names)
    }

    pub fn with_names(
        x: Array2<Value>,
        obs_names: Vec<String>,
        var_names: Vec<String>,
    ) -> Result<Self> {
        let table = Self {
            x,
            obs_names,
            obs: DataFrame::empty(),
            var_names,
            var: DataFrame::empty(),
            layers: BTreeMap::new(),
            uns: TableMetadata::default(),
        };
        table.validate()?;
        Ok(table)
    }

    /// Builds a table from named columns of equal length.
    pub fn from_columns<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<Value>)>,
        S: Into<String>,
    {
        let (names, cols): (Vec<String>, Vec<Vec<Value>>) = columns
            .into_iter()
            .map(|(name, values)| (name.into(), values))
            .unzip();
        let x = stack_columns(&names, cols)?;
        Self::new(x, names)
    }

    /// Checks the shape and uniqueness invariants.
    pub fn validate(&self) -> Result<()> {
        let (n_obs, n_vars) = self.x.dim();
        if self.var_names.len() != n_vars {
            return Err(ModelError::ShapeMismatch {
                what: "var_names".to_string(),
                expected: n_vars,
                found: self.var_names.len(),
            });
        }
        if self.obs_names.len() != n_obs {
            return Err(ModelError::ShapeMismatch {
                what: "obs_names".to_string(),
                expected: n_obs,
                found: self.obs_names.len(),
            });
        }
        let mut seen = BTreeSet::new();
        for name in &self.var_names {
            if !seen.insert(name.as_str()) {
                return Err(ModelError::DuplicateVariable(name.clone()));
            }
        }
        if self.obs.width() > 0 && self.obs.height() != n_obs {
            return Err(ModelError::ShapeMismatch {
                what: "obs".to_string(),
                expected: n_obs,
                found: self.obs.height(),
            });
        }
        if self.var.width() > 0 && self.var.height() != n_vars {
            return Err(ModelError::ShapeMismatch {
                what: "var".to_string(),
                expected: n_vars,
                found: self.var.height(),
            });
        }
        if let Some(history) = &self.uns.encoding {
            for archived in &history.original_values {
                if archived.values.len() != n_obs {
                    return Err(ModelError::ShapeMismatch {
                        what: format!("archived column {}", archived.name),
                        expected: n_obs,
                        found: archived.values.len(),
                    });
                }
            }
        }
        for (layer, values) in &self.layers {
            if values.dim() != (n_obs, n_vars) {
                return Err(ModelError::LayerShape {
                    layer: layer.clone(),
                    expected: (n_obs, n_vars),
                    found: values.dim(),
                });
            }
        }
        Ok(())
    }

    pub fn n_obs(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_vars(&self) -> usize {
        self.x.ncols()
    }

    pub fn var_index(&self, name: &str) -> Option<usize> {
        self.var_names.iter().position(|n| n == name)
    }

    /// View of one variable of `x`.
    pub fn column(&self, name: &str) -> Result<ArrayView1<'_, Value>> {
        let idx = self
            .var_index(name)
            .ok_or_else(|| ModelError::VariableNotFound(name.to_string()))?;
        Ok(self.x.column(idx))
    }

    /// `x` or a named layer.
    pub fn matrix(&self, layer: Option<&str>) -> Option<&Array2<Value>> {
        match layer {
            None => Some(&self.x),
            Some(name) => self.layers.get(name),
        }
    }

    pub fn is_encoded(&self) -> bool {
        self.uns.encoding.is_some()
    }

    pub fn has_text_cells(&self) -> bool {
        self.x.iter().any(Value::is_text)
    }

    /// Variables whose column in `x` contains at least one text cell.
    pub fn text_columns(&self) -> Vec<String> {
        self.x
            .axis_iter(Axis(1))
            .zip(&self.var_names)
            .filter(|(col, _)| col.iter().any(Value::is_text))
            .map(|(_, name)| name.clone())
            .collect()
    }

    /// Seeds `layers["original"]` from `x` when absent.
    pub fn ensure_original_layer(&mut self) {
        if !self.layers.contains_key(LAYER_ORIGINAL) {
            self.layers.insert(LAYER_ORIGINAL.to_string(), self.x.clone());
        }
    }
}

/// Stacks equally long columns into an observations x variables matrix.
pub fn stack_columns(names: &[String], columns: Vec<Vec<Value>>) -> Result<Array2<Value>> {
    let n_obs = columns.first().map_or(0, Vec::len);
    for (name, col) in names.iter().zip(&columns) {
        if col.len() != n_obs {
            return Err(ModelError::ShapeMismatch {
                what: format!("column {name}"),
                expected: n_obs,
                found: col.len(),
            });
        }
    }
    let n_vars = columns.len();
    let mut x = Array2::from_elem((n_obs, n_vars), Value::Missing);
    for (j, col) in columns.into_iter().enumerate() {
        for (i, value) in col.into_iter().enumerate() {
            x[[i, j]] = value;
        }
    }
    Ok(x)
}
