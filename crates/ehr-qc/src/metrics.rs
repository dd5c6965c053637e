//! Per-observation and per-variable quality-control metrics.

use ehr_common::any_to_bool;
use ehr_common::stats::{nan_max, nan_mean, nan_median, nan_min, nan_std};
use ehr_model::{AnnotatedTable, Value};
use ndarray::{Array2, Axis};
use polars::prelude::{Column, DataFrame, IntoColumn, NamedFrom, Series};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{QcError, Result};

/// Options for [`qc_metrics`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QcMetricsOptions {
    /// Boolean columns of `var` selecting variable subsets to total per row.
    pub qc_vars: Vec<String>,
    /// Layer to compute on; `None` uses `x`.
    pub layer: Option<String>,
    /// Merge the metrics into `obs` and `var`.
    pub inplace: bool,
    /// Also report `log1p` of the per-subset totals.
    pub log1p: bool,
}

impl Default for QcMetricsOptions {
    fn default() -> Self {
        Self {
            qc_vars: Vec::new(),
            layer: None,
            inplace: true,
            log1p: true,
        }
    }
}

impl QcMetricsOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_qc_vars<I, S>(mut self, qc_vars: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.qc_vars = qc_vars.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = Some(layer.into());
        self
    }

    pub fn with_inplace(mut self, inplace: bool) -> Self {
        self.inplace = inplace;
        self
    }

    pub fn with_log1p(mut self, log1p: bool) -> Self {
        self.log1p = log1p;
        self
    }
}

/// Computes missing-value counts, QC-variable totals and summary statistics.
///
/// Returns `(obs metrics, var metrics)`, one row per observation and per
/// variable in table order. With `inplace` the same columns are also merged
/// into `table.obs` and `table.var`, replacing columns of the same name.
pub fn qc_metrics(
    table: &mut AnnotatedTable,
    options: &QcMetricsOptions,
) -> Result<(DataFrame, DataFrame)> {
    let (obs_metrics, var_metrics) = {
        let matrix = table
            .matrix(options.layer.as_deref())
            .ok_or_else(|| QcError::LayerNotFound(options.layer.clone().unwrap_or_default()))?;
        (obs_metrics(table, matrix, options)?, var_metrics(matrix)?)
    };

    if options.inplace {
        merge_columns(&mut table.obs, &obs_metrics)?;
        merge_columns(&mut table.var, &var_metrics)?;
        info!(
            obs_columns = obs_metrics.width(),
            var_columns = var_metrics.width(),
            "added QC metrics to obs and var"
        );
    }
    Ok((obs_metrics, var_metrics))
}

fn f64_column(name: &str, values: Vec<f64>) -> Column {
    Series::new(name.into(), values).into_column()
}

fn qc_mask(table: &AnnotatedTable, name: &str) -> Result<Vec<bool>> {
    let column = table
        .var
        .column(name)
        .map_err(|_| QcError::QcVariableNotFound(name.to_string()))?;
    let invalid = || QcError::InvalidQcVariable {
        name: name.to_string(),
        expected: table.n_vars(),
    };
    if column.len() != table.n_vars() {
        return Err(invalid());
    }
    (0..column.len())
        .map(|i| column.get(i).ok().and_then(any_to_bool).ok_or_else(invalid))
        .collect()
}

/// Sums each row over the selected variables, skipping missing values.
fn row_totals(
    matrix: &Array2<Value>,
    var_names: &[String],
    mask: Option<&[bool]>,
) -> Result<Vec<f64>> {
    matrix
        .axis_iter(Axis(0))
        .map(|row| {
            let mut total = 0.0;
            for (j, value) in row.iter().enumerate() {
                if mask.is_some_and(|m| !m[j]) {
                    continue;
                }
                match value {
                    Value::Text(_) => {
                        return Err(QcError::NonNumeric {
                            variable: var_names[j].clone(),
                        });
                    }
                    other => total += other.as_f64().unwrap_or(0.0),
                }
            }
            Ok(total)
        })
        .collect()
}

fn obs_metrics(
    table: &AnnotatedTable,
    matrix: &Array2<Value>,
    options: &QcMetricsOptions,
) -> Result<DataFrame> {
    let n_vars = matrix.ncols() as f64;
    let missing: Vec<u32> = matrix
        .axis_iter(Axis(0))
        .map(|row| row.iter().filter(|v| v.is_missing()).count() as u32)
        .collect();
    let missing_pct: Vec<f64> = missing.iter().map(|m| f64::from(*m) / n_vars * 100.0).collect();

    let mut columns = vec![
        Series::new("missing_values_abs".into(), missing).into_column(),
        f64_column("missing_values_pct", missing_pct),
    ];

    if !options.qc_vars.is_empty() {
        let totals = row_totals(matrix, &table.var_names, None)?;
        for qc_var in &options.qc_vars {
            let mask = qc_mask(table, qc_var)?;
            let subset = row_totals(matrix, &table.var_names, Some(&mask))?;
            let pct: Vec<f64> = subset
                .iter()
                .zip(&totals)
                .map(|(s, t)| s / t * 100.0)
                .collect();
            if options.log1p {
                let log: Vec<f64> = subset.iter().map(|s| s.ln_1p()).collect();
                columns.push(f64_column(&format!("log1p_total_features_{qc_var}"), log));
            }
            columns.push(f64_column(&format!("total_features_{qc_var}"), subset));
            columns.push(f64_column(&format!("pct_features_{qc_var}"), pct));
            debug!(qc_var = %qc_var, "computed QC variable totals");
        }
        columns.push(f64_column("total_features", totals));
    }
    Ok(DataFrame::new(columns)?)
}

fn var_metrics(matrix: &Array2<Value>) -> Result<DataFrame> {
    let n_obs = matrix.nrows() as f64;
    let n_vars = matrix.ncols();
    let mut missing = Vec::with_capacity(n_vars);
    let mut missing_pct = Vec::with_capacity(n_vars);
    let mut mean = Vec::with_capacity(n_vars);
    let mut median = Vec::with_capacity(n_vars);
    let mut std = Vec::with_capacity(n_vars);
    let mut min = Vec::with_capacity(n_vars);
    let mut max = Vec::with_capacity(n_vars);

    for column in matrix.axis_iter(Axis(1)) {
        let count = column.iter().filter(|v| v.is_missing()).count() as u32;
        missing.push(count);
        missing_pct.push(f64::from(count) / n_obs * 100.0);

        let values: Option<Vec<f64>> = column.iter().map(Value::to_f64_or_nan).collect();
        match values {
            Some(values) => {
                mean.push(nan_mean(&values));
                median.push(nan_median(&values));
                std.push(nan_std(&values));
                min.push(nan_min(&values));
                max.push(nan_max(&values));
            }
            None => {
                for stat in [&mut mean, &mut median, &mut std, &mut min, &mut max] {
                    stat.push(f64::NAN);
                }
            }
        }
    }

    Ok(DataFrame::new(vec![
        Series::new("missing_values_abs".into(), missing).into_column(),
        f64_column("missing_values_pct", missing_pct),
        f64_column("mean", mean),
        f64_column("median", median),
        f64_column("standard_deviation", std),
        f64_column("min", min),
        f64_column("max", max),
    ])?)
}

/// Adds every column of `metrics` to `target`, replacing same-named columns.
fn merge_columns(target: &mut DataFrame, metrics: &DataFrame) -> Result<()> {
    for column in metrics.get_columns() {
        let name = column.name().as_str();
        if target.get_column_index(name).is_some() {
            target.drop_in_place(name)?;
        }
        target.with_column(column.clone())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labs() -> AnnotatedTable {
        let mut table = AnnotatedTable::from_columns([
            ("sodium", vec![Value::number(140.0), Value::Missing, Value::number(136.0)]),
            ("potassium", vec![Value::number(4.0), Value::number(5.0), Value::Missing]),
            ("note", vec![Value::text("ok"), Value::Missing, Value::text("hemolyzed")]),
        ])
        .expect("table");
        table.var = DataFrame::new(vec![
            Series::new("electrolyte".into(), vec![true, true, false]).into_column(),
        ])
        .expect("var");
        table
    }

    fn f64_values(df: &DataFrame, name: &str) -> Vec<f64> {
        df.column(name)
            .expect("column")
            .f64()
            .expect("f64")
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect()
    }

    #[test]
    fn missing_values_per_row_and_column() {
        let mut table = labs();
        let options = QcMetricsOptions::new().with_inplace(false);
        let (obs, var) = qc_metrics(&mut table, &options).expect("metrics");
        assert_eq!(obs.height(), 3);
        assert_eq!(var.height(), 3);
        let pct = f64_values(&obs, "missing_values_pct");
        assert!((pct[1] - 200.0 / 3.0).abs() < 1e-9);
        assert!((f64_values(&var, "missing_values_pct")[0] - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(table.obs.width(), 0);
    }

    #[test]
    fn text_columns_get_nan_statistics() {
        let mut table = labs();
        let (_, var) = qc_metrics(&mut table, &QcMetricsOptions::new()).expect("metrics");
        assert_eq!(f64_values(&var, "mean")[0], 138.0);
        assert_eq!(f64_values(&var, "median")[1], 4.5);
        assert_eq!(f64_values(&var, "standard_deviation")[1], 0.5);
        assert!(f64_values(&var, "max")[2].is_nan());
        // merged into var next to the existing mask column
        assert_eq!(table.var.width(), 8);
    }

    #[test]
    fn qc_variable_totals() {
        let mut table = labs();
        table.x[[0, 2]] = Value::number(10.0);
        table.x[[2, 2]] = Value::Missing;
        let options = QcMetricsOptions::new().with_qc_vars(["electrolyte"]);
        let (obs, _) = qc_metrics(&mut table, &options).expect("metrics");
        assert_eq!(f64_values(&obs, "total_features_electrolyte"), vec![144.0, 5.0, 136.0]);
        assert_eq!(f64_values(&obs, "total_features"), vec![154.0, 5.0, 136.0]);
        assert_eq!(f64_values(&obs, "pct_features_electrolyte")[1], 100.0);
        assert_eq!(
            f64_values(&obs, "log1p_total_features_electrolyte")[1],
            5f64.ln_1p()
        );
        assert!(table.obs.column("total_features").is_ok());
    }

    #[test]
    fn text_in_summed_columns_is_an_error() {
        let mut table = labs();
        let options = QcMetricsOptions::new().with_qc_vars(["electrolyte"]);
        let err = qc_metrics(&mut table, &options).unwrap_err();
        assert!(matches!(err, QcError::NonNumeric { variable } if variable == "note"));
    }

    #[test]
    fn unknown_layer_and_qc_var() {
        let mut table = labs();
        assert!(matches!(
            qc_metrics(&mut table, &QcMetricsOptions::new().with_layer("raw")),
            Err(QcError::LayerNotFound(layer)) if layer == "raw"
        ));
        table.x[[0, 2]] = Value::Missing;
        table.x[[2, 2]] = Value::Missing;
        assert!(matches!(
            qc_metrics(&mut table, &QcMetricsOptions::new().with_qc_vars(["renal"])),
            Err(QcError::QcVariableNotFound(name)) if name == "renal"
        ));
    }

    #[test]
    fn metric_column_layout() {
        let mut table = labs();
        table.x[[0, 2]] = Value::Missing;
        table.x[[2, 2]] = Value::Missing;
        let options = QcMetricsOptions::new().with_qc_vars(["electrolyte"]);
        let (obs, var) = qc_metrics(&mut table, &options).expect("metrics");
        let names = |df: &DataFrame| {
            df.get_column_names()
                .iter()
                .map(|n| n.to_string())
                .collect::<Vec<_>>()
                .join("\n")
        };
        insta::assert_snapshot!(names(&obs), @r"
        missing_values_abs
        missing_values_pct
        log1p_total_features_electrolyte
        total_features_electrolyte
        pct_features_electrolyte
        total_features
        ");
        insta::assert_snapshot!(names(&var), @r"
        missing_values_abs
        missing_values_pct
        mean
        median
        standard_deviation
        min
        max
        ");
    }
}
