//! Shared utilities for EHR toolkit crates.
//!
//! This crate provides common utilities used across the workspace:
//! Polars `AnyValue` helpers used when moving data between DataFrames and
//! annotated tables, and NaN-aware statistics.

pub mod polars;
pub mod stats;

// Re-export commonly used functions at crate root for convenience
pub use polars::{
    any_is_null, any_to_bool, any_to_f64, any_to_string, any_to_string_non_empty,
    format_numeric, is_numeric_dtype, parse_bool, parse_f64,
};
