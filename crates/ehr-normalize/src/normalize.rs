//! Applying normalization methods to the numeric variables of a table.

use std::collections::BTreeMap;

use ehr_model::{AnnotatedTable, LAYER_RAW, NormalizationMethod, Value, is_encoded_name};
use tracing::{debug, info};

use crate::error::{NormalizeError, Result};
use crate::methods;

/// Which methods to apply to which variables.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizationSpec {
    /// One method name for every numeric variable.
    All(String),
    /// `(method name, variables)` pairs, applied in order.
    PerVariable(Vec<(String, Vec<String>)>),
}

impl NormalizationSpec {
    pub fn all(method: impl Into<String>) -> Self {
        NormalizationSpec::All(method.into())
    }

    pub fn per_variable<I, M, V>(assignments: I) -> Self
    where
        I: IntoIterator<Item = (M, Vec<V>)>,
        M: Into<String>,
        V: Into<String>,
    {
        NormalizationSpec::PerVariable(
            assignments
                .into_iter()
                .map(|(m, vars)| (m.into(), vars.into_iter().map(Into::into).collect()))
                .collect(),
        )
    }
}

/// Variables eligible for normalization: every variable that is not the
/// output of an encoder.
pub fn numeric_variables(table: &AnnotatedTable) -> Vec<String> {
    table
        .var_names
        .iter()
        .filter(|name| !is_encoded_name(name))
        .cloned()
        .collect()
}

/// Normalizes numeric variables of `table`.
///
/// The table must hold no text and no pending non-numerical columns. The
/// values before the first normalization are kept in the `raw` layer and
/// every applied method is appended to `uns.normalization`.
///
/// With `copy` the input is left untouched and the normalized copy is
/// returned; otherwise `table` is modified in place and `None` is returned.
/// Encoding and decoding, by contrast, always return a new table.
pub fn normalize(
    table: &mut AnnotatedTable,
    methods: &NormalizationSpec,
    copy: bool,
) -> Result<Option<AnnotatedTable>> {
    let plan = resolve(table, methods)?;
    if copy {
        let mut normalized = table.clone();
        apply(&mut normalized, &plan)?;
        Ok(Some(normalized))
    } else {
        apply(table, &plan)?;
        Ok(None)
    }
}

fn assert_encoded(table: &AnnotatedTable) -> Result<()> {
    let mut pending = table.text_columns();
    for name in &table.uns.non_numerical_columns {
        if !pending.contains(name) {
            pending.push(name.clone());
        }
    }
    if pending.is_empty() {
        Ok(())
    } else {
        Err(NormalizeError::NotEncoded { columns: pending })
    }
}

fn parse_method(name: &str) -> Result<NormalizationMethod> {
    name.parse()
        .map_err(|_| NormalizeError::UnknownMethod(name.to_string()))
}

fn resolve(
    table: &AnnotatedTable,
    methods: &NormalizationSpec,
) -> Result<Vec<(NormalizationMethod, Vec<String>)>> {
    assert_encoded(table)?;
    let numeric = numeric_variables(table);
    match methods {
        NormalizationSpec::All(name) => Ok(vec![(parse_method(name)?, numeric)]),
        NormalizationSpec::PerVariable(assignments) => {
            let mut plan = Vec::with_capacity(assignments.len());
            for (name, _) in assignments {
                parse_method(name)?;
            }
            for (name, vars) in assignments {
                if let Some(bad) = vars.iter().find(|v| !numeric.contains(v)) {
                    return Err(NormalizeError::NotNumeric(bad.clone()));
                }
                plan.push((parse_method(name)?, vars.clone()));
            }
            Ok(plan)
        }
    }
}

fn apply(table: &mut AnnotatedTable, plan: &[(NormalizationMethod, Vec<String>)]) -> Result<()> {
    // Stage every column first so a failing method leaves the table untouched.
    let mut staged: BTreeMap<usize, Vec<f64>> = BTreeMap::new();
    for (method, vars) in plan {
        for var in vars {
            let idx = table
                .var_index(var)
                .ok_or_else(|| NormalizeError::NotNumeric(var.clone()))?;
            let current = staged.entry(idx).or_insert_with(|| {
                table
                    .x
                    .column(idx)
                    .iter()
                    .map(|v| v.as_f64().unwrap_or(f64::NAN))
                    .collect()
            });
            let next = methods::apply(*method, current).map_err(|rejected| {
                NormalizeError::InvalidData {
                    method: *method,
                    variable: var.clone(),
                    reason: rejected.0,
                }
            })?;
            *current = next;
            debug!(%method, variable = %var, "normalized");
        }
    }

    if !table.layers.contains_key(LAYER_RAW) {
        table.layers.insert(LAYER_RAW.to_string(), table.x.clone());
        info!("stored pre-normalization values in the raw layer");
    }
    for (idx, values) in staged {
        for (row, value) in values.into_iter().enumerate() {
            table.x[[row, idx]] = Value::number(value);
        }
    }
    for (method, vars) in plan {
        for var in vars {
            table
                .uns
                .normalization
                .entry(var.clone())
                .or_default()
                .push(*method);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vitals() -> AnnotatedTable {
        let mut table = AnnotatedTable::from_columns([
            ("hr", vec![Value::number(60.0), Value::number(80.0), Value::number(100.0)]),
            ("temp", vec![Value::number(36.5), Value::Missing, Value::number(38.5)]),
        ])
        .expect("table");
        table.uns.numerical_columns = vec!["hr".into(), "temp".into()];
        table
    }

    #[test]
    fn minmax_all_in_place() {
        let mut table = vitals();
        let out = normalize(&mut table, &NormalizationSpec::all("minmax"), false).expect("normalize");
        assert!(out.is_none());
        assert_eq!(table.x[[1, 0]], Value::number(0.5));
        assert_eq!(table.x[[1, 1]], Value::Missing);
        assert_eq!(table.x[[2, 1]], Value::number(1.0));
        assert_eq!(table.layers[LAYER_RAW][[0, 0]], Value::number(60.0));
        assert_eq!(
            table.uns.normalization["hr"],
            vec![NormalizationMethod::MinMax]
        );
    }

    #[test]
    fn copy_leaves_input_untouched() {
        let mut table = vitals();
        let out = normalize(&mut table, &NormalizationSpec::all("scale"), true)
            .expect("normalize")
            .expect("copy");
        assert_eq!(table.x[[0, 0]], Value::number(60.0));
        assert!(table.layers.is_empty());
        assert!(table.uns.normalization.is_empty());
        assert_eq!(out.x[[1, 0]], Value::number(0.0));
    }

    #[test]
    fn raw_layer_is_written_once() {
        let mut table = vitals();
        normalize(&mut table, &NormalizationSpec::all("maxabs"), false).expect("first");
        normalize(&mut table, &NormalizationSpec::all("identity"), false).expect("second");
        assert_eq!(table.layers[LAYER_RAW][[2, 0]], Value::number(100.0));
        assert_eq!(
            table.uns.normalization["temp"],
            vec![NormalizationMethod::MaxAbs, NormalizationMethod::Identity]
        );
    }

    #[test]
    fn failing_method_does_not_mutate() {
        let mut table = vitals();
        table.x[[0, 1]] = Value::number(-1.0);
        let spec = NormalizationSpec::per_variable([
            ("scale", vec!["hr"]),
            ("power_box_cox", vec!["temp"]),
        ]);
        let err = normalize(&mut table, &spec, false).unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidData { ref variable, .. } if variable == "temp"));
        assert_eq!(table.x[[0, 0]], Value::number(60.0));
        assert!(table.layers.is_empty());
        assert!(table.uns.normalization.is_empty());
    }

    #[test]
    fn validation_errors() {
        let mut table = vitals();
        assert!(matches!(
            normalize(&mut table, &NormalizationSpec::all("zscore"), false),
            Err(NormalizeError::UnknownMethod(_))
        ));
        let spec = NormalizationSpec::per_variable([("scale", vec!["bmi"])]);
        assert!(matches!(
            normalize(&mut table, &spec, false),
            Err(NormalizeError::NotNumeric(name)) if name == "bmi"
        ));
    }
}
