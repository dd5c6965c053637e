//! Reverting an encoded table to its original values.

use std::collections::BTreeMap;

use ehr_model::{AnnotatedTable, EncodingHistory, LAYER_ORIGINAL, Value, is_encoded_name};
use polars::prelude::DataFrame;
use tracing::{debug, warn};

use crate::encode::assemble;
use crate::error::Result;
use crate::obs;

/// Which encodings to revert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DecodeScope {
    #[default]
    All,
    /// Reverting individual columns is not supported; decoding with this
    /// scope warns and returns `None`.
    Columns(Vec<String>),
}

/// Restores the original values of every encoded column.
///
/// Returns `Ok(None)` with a warning when the table was never encoded or
/// when a partial scope is requested. The input table is never modified.
pub fn decode(table: &AnnotatedTable, scope: &DecodeScope) -> Result<Option<AnnotatedTable>> {
    let Some(history) = &table.uns.encoding else {
        warn!("decoding a table that was never encoded");
        return Ok(None);
    };
    if let DecodeScope::Columns(columns) = scope {
        warn!(?columns, "only all encodings can be reverted at once, aborting");
        return Ok(None);
    }
    decode_all(table, history).map(Some)
}

pub(crate) fn decode_all(table: &AnnotatedTable, history: &EncodingHistory) -> Result<AnnotatedTable> {
    let mut var_names = Vec::new();
    let mut columns: Vec<Vec<Value>> = Vec::new();
    for archived in &history.original_values {
        var_names.push(archived.name.clone());
        columns.push(archived.values.clone());
    }
    for (j, name) in table.var_names.iter().enumerate() {
        if !is_encoded_name(name) {
            var_names.push(name.clone());
            columns.push(table.x.column(j).to_vec());
        }
    }
    let x = assemble(table.n_obs(), &var_names, &columns)?;

    let mut obs = table.obs.clone();
    obs::drop_columns(&mut obs, history.obs_columns.iter().map(String::as_str))?;

    let mut uns = table.uns.clone();
    uns.encoding = None;
    for archived in &history.original_values {
        uns.unclassify(&archived.name);
        let first = archived.values.iter().find(|v| !v.is_missing());
        match first {
            Some(Value::Number(_)) => uns.numerical_columns.push(archived.name.clone()),
            _ => uns.non_numerical_columns.push(archived.name.clone()),
        }
    }

    let decoded = AnnotatedTable {
        layers: BTreeMap::from([(LAYER_ORIGINAL.to_string(), x.clone())]),
        x,
        obs_names: table.obs_names.clone(),
        obs,
        var_names,
        var: DataFrame::empty(),
        uns,
    };
    decoded.validate()?;
    debug!(
        restored = history.original_values.len(),
        "encoding of the table was reset"
    );
    Ok(decoded)
}
