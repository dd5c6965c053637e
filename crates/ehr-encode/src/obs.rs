//! Copies original categorical values into the observation annotations.

use ehr_common::parse_bool;
use ehr_model::Value;
use ndarray::ArrayView1;
use polars::prelude::{DataFrame, NamedFrom, Series};

use crate::error::Result;

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Number(v) if *v == 0.0 => Some(false),
        Value::Number(v) if *v == 1.0 => Some(true),
        Value::Text(s) => parse_bool(s),
        _ => None,
    }
}

/// Builds a typed series: boolean when every present value is 0/1 or
/// true/false, float when every present value is numeric, string otherwise.
pub(crate) fn series_from_values(name: &str, values: ArrayView1<'_, Value>) -> Series {
    let present = || values.iter().filter(|v| !v.is_missing());
    if present().all(|v| as_bool(v).is_some()) {
        let data: Vec<Option<bool>> = values.iter().map(as_bool).collect();
        Series::new(name.into(), data)
    } else if present().all(|v| v.as_f64().is_some()) {
        let data: Vec<Option<f64>> = values.iter().map(Value::as_f64).collect();
        Series::new(name.into(), data)
    } else {
        let data: Vec<Option<String>> = values
            .iter()
            .map(|v| (!v.is_missing()).then(|| v.to_string()))
            .collect();
        Series::new(name.into(), data)
    }
}

/// Adds `values` as column `name` unless `obs` already has it.
///
/// Returns `true` when the column was added.
pub(crate) fn add_column(obs: &mut DataFrame, name: &str, values: ArrayView1<'_, Value>) -> Result<bool> {
    if obs.get_column_index(name).is_some() {
        return Ok(false);
    }
    obs.with_column(series_from_values(name, values))?;
    Ok(true)
}

/// Removes the named columns from `obs` where present.
pub(crate) fn drop_columns<'a>(
    obs: &mut DataFrame,
    names: impl IntoIterator<Item = &'a str>,
) -> Result<()> {
    for name in names {
        if obs.get_column_index(name).is_some() {
            obs.drop_in_place(name)?;
        }
    }
    Ok(())
}
