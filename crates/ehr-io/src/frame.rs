//! Typed, serializable form of polars annotation columns.

use polars::prelude::{Column, DataFrame, DataType, IntoColumn, NamedFrom, PolarsResult, Series};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dtype", rename_all = "snake_case")]
pub(crate) enum FrameColumn {
    Boolean {
        name: String,
        values: Vec<Option<bool>>,
    },
    Integer {
        name: String,
        values: Vec<Option<i64>>,
    },
    Float {
        name: String,
        values: Vec<Option<f64>>,
    },
    /// Any other dtype, stored as its string rendering.
    Text {
        name: String,
        values: Vec<Option<String>>,
    },
}

impl FrameColumn {
    pub(crate) fn from_column(column: &Column) -> PolarsResult<Self> {
        let name = column.name().to_string();
        Ok(match column.dtype() {
            DataType::Boolean => Self::Boolean {
                name,
                values: column.bool()?.into_iter().collect(),
            },
            dtype if dtype.is_integer() => Self::Integer {
                name,
                values: column.cast(&DataType::Int64)?.i64()?.into_iter().collect(),
            },
            dtype if dtype.is_float() => Self::Float {
                name,
                values: column.cast(&DataType::Float64)?.f64()?.into_iter().collect(),
            },
            _ => Self::Text {
                name,
                values: column
                    .cast(&DataType::String)?
                    .str()?
                    .into_iter()
                    .map(|v| v.map(str::to_string))
                    .collect(),
            },
        })
    }

    pub(crate) fn into_polars(self) -> Column {
        match self {
            Self::Boolean { name, values } => Series::new(name.into(), values).into_column(),
            Self::Integer { name, values } => Series::new(name.into(), values).into_column(),
            Self::Float { name, values } => Series::new(name.into(), values).into_column(),
            Self::Text { name, values } => Series::new(name.into(), values).into_column(),
        }
    }
}

pub(crate) fn frame_to_columns(df: &DataFrame) -> PolarsResult<Vec<FrameColumn>> {
    df.get_columns().iter().map(FrameColumn::from_column).collect()
}

pub(crate) fn columns_to_frame(columns: Vec<FrameColumn>) -> PolarsResult<DataFrame> {
    if columns.is_empty() {
        return Ok(DataFrame::empty());
    }
    DataFrame::new(columns.into_iter().map(FrameColumn::into_polars).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dtypes_survive_json() {
        let df = DataFrame::new(vec![
            Series::new("icu".into(), vec![Some(true), None]).into_column(),
            Series::new("los_days".into(), vec![Some(3i32), Some(12)]).into_column(),
            Series::new("bmi".into(), vec![Some(22.5), None]).into_column(),
            Series::new("ward".into(), vec![Some("cardio"), None]).into_column(),
        ])
        .expect("frame");

        let json = serde_json::to_string(&frame_to_columns(&df).expect("columns")).expect("json");
        let columns: Vec<FrameColumn> = serde_json::from_str(&json).expect("parse");
        assert!(matches!(&columns[1], FrameColumn::Integer { values, .. } if values == &[Some(3), Some(12)]));

        let restored = columns_to_frame(columns).expect("frame");
        assert_eq!(restored.column("icu").expect("icu").dtype(), &DataType::Boolean);
        assert_eq!(restored.column("los_days").expect("los").dtype(), &DataType::Int64);
        assert_eq!(restored.column("ward").expect("ward").null_count(), 1);
        assert_eq!(restored.height(), 2);
    }

    #[test]
    fn empty_frame_round_trips() {
        let columns = frame_to_columns(&DataFrame::empty()).expect("columns");
        assert!(columns.is_empty());
        assert_eq!(columns_to_frame(columns).expect("frame").width(), 0);
    }
}
