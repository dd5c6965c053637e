//! NaN-aware summary statistics.
//!
//! Missing values are represented as `NaN` and skipped by every function.
//! Functions return `NaN` when no value is present.

/// Non-missing values of `values`.
pub fn present(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| !v.is_nan()).collect()
}

/// Non-missing values in ascending order.
pub fn sorted_present(values: &[f64]) -> Vec<f64> {
    let mut sorted = present(values);
    sorted.sort_by(f64::total_cmp);
    sorted
}

pub fn nan_sum(values: &[f64]) -> f64 {
    values.iter().filter(|v| !v.is_nan()).sum()
}

pub fn nan_mean(values: &[f64]) -> f64 {
    let present = present(values);
    if present.is_empty() {
        return f64::NAN;
    }
    present.iter().sum::<f64>() / present.len() as f64
}

/// Population variance (`ddof = 0`).
pub fn nan_var(values: &[f64]) -> f64 {
    let present = present(values);
    if present.is_empty() {
        return f64::NAN;
    }
    let n = present.len() as f64;
    let mean = present.iter().sum::<f64>() / n;
    present.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

/// Population standard deviation (`ddof = 0`).
pub fn nan_std(values: &[f64]) -> f64 {
    nan_var(values).sqrt()
}

pub fn nan_min(values: &[f64]) -> f64 {
    values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .reduce(f64::min)
        .unwrap_or(f64::NAN)
}

pub fn nan_max(values: &[f64]) -> f64 {
    values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .reduce(f64::max)
        .unwrap_or(f64::NAN)
}

/// Linear-interpolated quantile of already sorted values, `q` in `[0, 1]`.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            let frac = pos - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

pub fn nan_quantile(values: &[f64], q: f64) -> f64 {
    quantile_sorted(&sorted_present(values), q)
}

pub fn nan_median(values: &[f64]) -> f64 {
    nan_quantile(values, 0.5)
}
