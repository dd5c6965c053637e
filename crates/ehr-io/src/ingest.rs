//! Building annotated tables from polars frames and CSV files.

use std::path::Path;

use anyhow::{Context, Result};
use ehr_common::{any_is_null, any_to_f64, any_to_string, any_to_string_non_empty, is_numeric_dtype};
use ehr_model::{AnnotatedTable, Value, stack_columns};
use polars::prelude::{Column, CsvReadOptions, DataFrame, DataType, SerReader};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// How a frame is split into observation names, annotations and data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestOptions {
    /// Column whose values become the observation names.
    pub index_column: Option<String>,
    /// Columns kept only as observation annotations, outside the matrix.
    pub columns_obs_only: Vec<String>,
}

impl IngestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_index_column(mut self, column: impl Into<String>) -> Self {
        self.index_column = Some(column.into());
        self
    }

    pub fn with_columns_obs_only<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns_obs_only = columns.into_iter().map(Into::into).collect();
        self
    }
}

/// Reads a CSV file with a header row into an annotated table.
pub fn read_csv(path: &Path, options: &IngestOptions) -> Result<AnnotatedTable> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(100))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .with_context(|| format!("open {}", path.display()))?
        .finish()
        .with_context(|| format!("parse {}", path.display()))?;
    debug!(path = %path.display(), rows = df.height(), columns = df.width(), "read CSV");
    table_from_frame(df, options).with_context(|| format!("build table from {}", path.display()))
}

fn column_values(column: &Column) -> Vec<Value> {
    let numeric = is_numeric_dtype(column.dtype()) || column.dtype() == &DataType::Boolean;
    column
        .as_materialized_series()
        .iter()
        .map(|value| {
            if any_is_null(&value) {
                Value::Missing
            } else if numeric {
                any_to_f64(value).map_or(Value::Missing, Value::number)
            } else {
                any_to_string_non_empty(value).map_or(Value::Missing, Value::Text)
            }
        })
        .collect()
}

/// Numeric columns are numerical unless they only hold 0 and 1.
fn is_numerical(values: &[Value]) -> bool {
    if values.iter().any(Value::is_text) {
        return false;
    }
    let mut present = values.iter().filter_map(Value::as_f64).peekable();
    let binary = present.peek().is_some() && present.all(|v| v == 0.0 || v == 1.0);
    !binary
}

/// Splits `df` into observation names, `obs` annotations and the matrix.
///
/// The `original` layer starts as a copy of `x`.
pub fn table_from_frame(mut df: DataFrame, options: &IngestOptions) -> Result<AnnotatedTable> {
    let obs_names = match &options.index_column {
        Some(index) => {
            let column = df
                .drop_in_place(index)
                .with_context(|| format!("index column {index}"))?;
            column
                .as_materialized_series()
                .iter()
                .map(any_to_string)
                .collect()
        }
        None => (0..df.height()).map(|i| i.to_string()).collect(),
    };

    let mut obs_columns = Vec::with_capacity(options.columns_obs_only.len());
    for name in &options.columns_obs_only {
        let column = df
            .drop_in_place(name)
            .with_context(|| format!("obs-only column {name}"))?;
        obs_columns.push(column);
    }
    let obs = if obs_columns.is_empty() {
        DataFrame::empty()
    } else {
        DataFrame::new(obs_columns)?
    };

    let mut var_names = Vec::with_capacity(df.width());
    let mut columns = Vec::with_capacity(df.width());
    let mut numerical = Vec::new();
    let mut non_numerical = Vec::new();
    for column in df.get_columns() {
        let name = column.name().to_string();
        let values = column_values(column);
        if is_numerical(&values) {
            numerical.push(name.clone());
        } else {
            debug!(column = %name, "flagged as non-numerical");
            non_numerical.push(name.clone());
        }
        var_names.push(name);
        columns.push(values);
    }

    let x = stack_columns(&var_names, columns)?;
    let mut table = AnnotatedTable::with_names(x, obs_names, var_names)?;
    table.obs = obs;
    table.uns.numerical_columns = numerical;
    table.uns.non_numerical_columns = non_numerical;
    table.ensure_original_layer();
    table.validate()?;

    info!(
        n_obs = table.n_obs(),
        n_vars = table.n_vars(),
        non_numerical = table.uns.non_numerical_columns.len(),
        "built annotated table"
    );
    Ok(table)
}
