//! Encoding of categorical variables into numeric blocks.

use std::collections::{BTreeMap, BTreeSet};

use ehr_model::{
    AnnotatedTable, ArchivedColumn, ColumnSelection, EncodingHistory, EncodingMode,
    LAYER_ORIGINAL, ModelError, TableMetadata, Value, is_encoded_name,
};
use ndarray::{Array2, ArrayView1};
use polars::prelude::DataFrame;
use tracing::{debug, info, warn};

use crate::decode::decode_all;
use crate::error::{EncodeError, Result};
use crate::obs;
use crate::plan::{EncodingPlan, EncodingSpec};
use crate::strategies::{EncodedBlock, Strategy};

/// Mode used for autodetected columns when none is given.
pub const DEFAULT_AUTODETECT_MODE: EncodingMode = EncodingMode::Label;

/// Encodes categorical variables of `table` and returns the encoded table.
///
/// With `autodetect`, every column listed in `uns.non_numerical_columns` is
/// encoded with the mode named by `EncodingSpec::Mode` (label encoding when
/// `spec` is `None`). Without it, `spec` must assign columns to modes
/// explicitly; a previously encoded table is then re-encoded, keeping earlier
/// assignments that the new request does not override.
///
/// The input table is never modified.
pub fn encode(
    table: &AnnotatedTable,
    autodetect: bool,
    spec: Option<&EncodingSpec>,
) -> Result<AnnotatedTable> {
    match (autodetect, spec) {
        (true, None) => encode_autodetect(table, None),
        (true, Some(EncodingSpec::Mode(mode))) => encode_autodetect(table, Some(mode)),
        (true, Some(EncodingSpec::Columns(_))) => Err(EncodeError::InvalidInput(
            "column assignments require autodetect to be disabled".to_string(),
        )),
        (false, Some(EncodingSpec::Columns(request))) => encode_columns(table, request),
        (false, Some(EncodingSpec::Mode(_))) => Err(EncodeError::InvalidInput(
            "a single encoding mode is only accepted with autodetect".to_string(),
        )),
        (false, None) => Err(EncodeError::InvalidInput(
            "either enable autodetect or assign columns to encodings".to_string(),
        )),
    }
}

fn encode_autodetect(table: &AnnotatedTable, mode: Option<&str>) -> Result<AnnotatedTable> {
    let mode = match mode {
        Some(name) => name
            .parse::<EncodingMode>()
            .map_err(|_| EncodeError::UnknownEncoding(name.to_string()))?,
        None => DEFAULT_AUTODETECT_MODE,
    };
    if mode.is_multi_column() {
        return Err(EncodeError::InvalidInput(format!(
            "{mode} needs explicit column groups and cannot be used with autodetect"
        )));
    }
    if table.is_encoded() {
        warn!("table is already encoded, returning it unchanged");
        return Ok(table.clone());
    }
    let columns = table.uns.non_numerical_columns.clone();
    if columns.is_empty() {
        warn!("no non-numerical columns detected, returning table unchanged");
        return Ok(table.clone());
    }
    if let Some(missing) = columns.iter().find(|c| table.var_index(c).is_none()) {
        return Err(EncodeError::ColumnNotFound(missing.clone()));
    }
    debug!(%mode, columns = columns.len(), "encoding autodetected columns");
    apply_plan(table, &EncodingPlan::uniform(mode, &columns), Vec::new())
}

fn encode_columns(
    table: &AnnotatedTable,
    request: &[(String, Vec<ColumnSelection>)],
) -> Result<AnnotatedTable> {
    let plan = EncodingPlan::parse(request)?;
    let archived: BTreeSet<&str> = table
        .uns
        .encoding
        .iter()
        .flat_map(EncodingHistory::archived_names)
        .collect();
    for column in plan.columns() {
        let present = archived.contains(column)
            || (!is_encoded_name(column) && table.var_index(column).is_some());
        if !present {
            return Err(EncodeError::ColumnNotFound(column.to_string()));
        }
        if table.uns.is_numerical(column) {
            warn!(
                column,
                "encoding a column with numerical values is generally not recommended"
            );
        }
    }

    match &table.uns.encoding {
        Some(history) => {
            let plan = plan.merge_previous(history)?;
            let mut base = decode_all(table, history)?;
            base.uns.non_numerical_columns = table.uns.non_numerical_columns.clone();
            info!("re-encoding previously encoded table");
            apply_plan(&base, &plan, history.original_values.clone())
        }
        None => apply_plan(table, &plan, Vec::new()),
    }
}

/// Archived form of a column: numbers stay numbers for numerical columns and
/// for columns holding only numbers, anything else is stored as text.
fn archive_values(column: ArrayView1<'_, Value>, numerical: bool) -> Vec<Value> {
    let keep_numbers = numerical || column.iter().all(|v| !v.is_text());
    column
        .iter()
        .map(|value| match value {
            v if v.is_missing() => Value::Missing,
            Value::Number(n) if !keep_numbers => Value::Text(Value::number(*n).to_string()),
            other => other.clone(),
        })
        .collect()
}

/// Matrix with `n_obs` rows from columns of exactly `n_obs` values.
pub(crate) fn assemble(
    n_obs: usize,
    names: &[String],
    columns: &[Vec<Value>],
) -> Result<Array2<Value>> {
    if let Some((name, column)) = names
        .iter()
        .zip(columns)
        .find(|(_, column)| column.len() != n_obs)
    {
        return Err(ModelError::ShapeMismatch {
            what: format!("column {name}"),
            expected: n_obs,
            found: column.len(),
        }
        .into());
    }
    Ok(Array2::from_shape_fn((n_obs, columns.len()), |(i, j)| {
        columns[j][i].clone()
    }))
}

fn apply_plan(
    base: &AnnotatedTable,
    plan: &EncodingPlan,
    archive: Vec<ArchivedColumn>,
) -> Result<AnnotatedTable> {
    let planned: BTreeSet<&str> = plan.columns().collect();

    let mut history = EncodingHistory {
        original_values: archive,
        ..EncodingHistory::default()
    };
    for (j, name) in base.var_names.iter().enumerate() {
        if planned.contains(name.as_str()) {
            let numerical = base.uns.is_numerical(name);
            if history.archive(name, archive_values(base.x.column(j), numerical)) {
                debug!(column = %name, "archived original values");
            }
        }
    }

    let mut blocks: Vec<EncodedBlock> = Vec::new();
    for (mode, selections) in plan.entries() {
        let strategy = Strategy::from(*mode);
        for selection in selections {
            let inputs = selection
                .names()
                .iter()
                .map(|name| {
                    history
                        .archived(name)
                        .ok_or_else(|| EncodeError::ColumnNotFound(name.clone()))
                })
                .collect::<Result<Vec<_>>>()?;
            let block = strategy.encode(&inputs)?;
            debug!(%mode, columns = ?selection.names(), width = block.width(), "encoded");
            blocks.push(block);
        }
    }
    for (mode, selections) in plan.entries() {
        for selection in selections {
            history.record(*mode, selection.clone());
        }
    }

    let remaining: Vec<usize> = (0..base.n_vars())
        .filter(|j| !planned.contains(base.var_names[*j].as_str()))
        .collect();
    let uncovered: Vec<String> = remaining
        .iter()
        .filter(|j| base.x.column(**j).iter().any(Value::is_text))
        .map(|j| base.var_names[*j].clone())
        .collect();
    if !uncovered.is_empty() {
        return Err(EncodeError::Construction { columns: uncovered });
    }

    let original_layer = base.layers.get(LAYER_ORIGINAL).unwrap_or(&base.x);
    let mut var_names = Vec::new();
    let mut x_columns = Vec::new();
    let mut layer_columns = Vec::new();
    for block in blocks {
        var_names.extend(block.names);
        layer_columns.extend(block.columns.iter().cloned());
        x_columns.extend(block.columns);
    }
    for j in &remaining {
        var_names.push(base.var_names[*j].clone());
        x_columns.push(base.x.column(*j).to_vec());
        layer_columns.push(original_layer.column(*j).to_vec());
    }

    let mut obs = base.obs.clone();
    for (j, name) in base.var_names.iter().enumerate() {
        if planned.contains(name.as_str()) {
            if obs::add_column(&mut obs, name, base.x.column(j))? {
                history.obs_columns.push(name.clone());
            } else {
                debug!(column = %name, "obs already has a column of this name, keeping it");
            }
        }
    }

    let mut uns = TableMetadata {
        numerical_columns: base.uns.numerical_columns.clone(),
        non_numerical_columns: base.uns.non_numerical_columns.clone(),
        encoding: None,
        normalization: base.uns.normalization.clone(),
    };
    for name in &planned {
        uns.unclassify(name);
    }
    uns.encoding = Some(history);

    let n_obs = base.n_obs();
    let layer = assemble(n_obs, &var_names, &layer_columns)?;
    let encoded = AnnotatedTable {
        x: assemble(n_obs, &var_names, &x_columns)?,
        obs_names: base.obs_names.clone(),
        obs,
        var_names,
        var: DataFrame::empty(),
        layers: BTreeMap::from([(LAYER_ORIGINAL.to_string(), layer)]),
        uns,
    };
    encoded.validate()?;
    info!(
        encoded = planned.len(),
        n_vars = encoded.n_vars(),
        "updated original layer and encoding history"
    );
    Ok(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    #[test]
    fn archive_keeps_numeric_columns_numeric() {
        let column = Array1::from(vec![Value::number(0.0), Value::Missing, Value::number(1.0)]);
        assert_eq!(
            archive_values(column.view(), false),
            vec![Value::number(0.0), Value::Missing, Value::number(1.0)]
        );
    }

    #[test]
    fn archive_stringifies_mixed_columns() {
        let column = Array1::from(vec![Value::number(2.0), Value::text("unknown")]);
        assert_eq!(
            archive_values(column.view(), false),
            vec![Value::text("2"), Value::text("unknown")]
        );
    }

    #[test]
    fn spec_and_autodetect_must_agree() {
        let table = AnnotatedTable::from_columns([("a", vec![Value::number(1.0)])]).expect("table");
        let columns = EncodingSpec::columns([("label_encoding", vec!["a".into()])]);
        assert!(matches!(
            encode(&table, true, Some(&columns)),
            Err(EncodeError::InvalidInput(_))
        ));
        assert!(matches!(
            encode(&table, false, Some(&EncodingSpec::mode("label_encoding"))),
            Err(EncodeError::InvalidInput(_))
        ));
        assert!(matches!(
            encode(&table, false, None),
            Err(EncodeError::InvalidInput(_))
        ));
    }

    #[test]
    fn autodetect_rejects_hash() {
        let table = AnnotatedTable::from_columns([("a", vec![Value::text("x")])]).expect("table");
        assert!(matches!(
            encode(&table, true, Some(&EncodingSpec::mode("hash_encoding"))),
            Err(EncodeError::InvalidInput(_))
        ));
        assert!(matches!(
            encode(&table, true, Some(&EncodingSpec::mode("frequency"))),
            Err(EncodeError::UnknownEncoding(_))
        ));
    }
}
