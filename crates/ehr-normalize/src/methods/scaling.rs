use ehr_common::stats::{nan_max, nan_mean, nan_median, nan_min, nan_quantile, nan_std};

use super::{map_present, nonzero};

/// Standardizes to zero mean and unit (population) variance.
pub fn scale(values: &[f64]) -> Vec<f64> {
    let mean = nan_mean(values);
    let std = nonzero(nan_std(values));
    map_present(values, |v| (v - mean) / std)
}

/// Rescales to `[0, 1]`.
pub fn minmax(values: &[f64]) -> Vec<f64> {
    let min = nan_min(values);
    let range = nonzero(nan_max(values) - min);
    map_present(values, |v| (v - min) / range)
}

/// Divides by the maximum absolute value.
pub fn maxabs(values: &[f64]) -> Vec<f64> {
    let abs: Vec<f64> = values.iter().map(|v| v.abs()).collect();
    let max = nonzero(nan_max(&abs));
    map_present(values, |v| v / max)
}

/// Centers on the median and scales by the interquartile range.
pub fn robust_scale(values: &[f64]) -> Vec<f64> {
    let median = nan_median(values);
    let iqr = nonzero(nan_quantile(values, 0.75) - nan_quantile(values, 0.25));
    map_present(values, |v| (v - median) / iqr)
}
