//! Column-wise rescaling functions.
//!
//! Every function takes one column with missing values as `NaN`, fits on
//! the present values only and leaves missing values missing.

mod power;
mod quantile;
mod scaling;

use ehr_model::NormalizationMethod;

pub use power::{box_cox, yeo_johnson};
pub use quantile::{quantile_normal, quantile_uniform};
pub use scaling::{maxabs, minmax, robust_scale, scale};

/// Why a column cannot be transformed.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejected(pub String);

/// Applies `method` to one column.
pub fn apply(method: NormalizationMethod, values: &[f64]) -> Result<Vec<f64>, Rejected> {
    Ok(match method {
        NormalizationMethod::Scale => scale(values),
        NormalizationMethod::MinMax => minmax(values),
        NormalizationMethod::MaxAbs => maxabs(values),
        NormalizationMethod::RobustScale => robust_scale(values),
        NormalizationMethod::QuantileUniform => quantile_uniform(values),
        NormalizationMethod::QuantileNormal => quantile_normal(values),
        NormalizationMethod::PowerYeoJohnson => yeo_johnson(values),
        NormalizationMethod::PowerBoxCox => box_cox(values)?,
        NormalizationMethod::Identity => values.to_vec(),
    })
}

/// Replaces a zero (or undefined) spread with 1.
fn nonzero(spread: f64) -> f64 {
    if spread == 0.0 || !spread.is_finite() {
        1.0
    } else {
        spread
    }
}

fn map_present(values: &[f64], f: impl Fn(f64) -> f64) -> Vec<f64> {
    values
        .iter()
        .map(|&v| if v.is_nan() { v } else { f(v) })
        .collect()
}

#[cfg(test)]
pub(crate) fn assert_close(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(expected) {
        if e.is_nan() {
            assert!(a.is_nan(), "expected NaN, got {a}");
        } else {
            assert!((a - e).abs() < 1e-6, "expected {e}, got {a} in {actual:?}");
        }
    }
}
