use ehr_common::stats::present;

use super::scaling::scale;
use super::Rejected;

/// Search interval for the transformation parameter.
const LAMBDA_BOUNDS: (f64, f64) = (-2.0, 2.0);

/// Yeo-Johnson power transform followed by standardization.
pub fn yeo_johnson(values: &[f64]) -> Vec<f64> {
    let data = present(values);
    let lambda = fit_yeo_johnson(&data);
    let transformed: Vec<f64> = values
        .iter()
        .map(|&v| if v.is_nan() { v } else { yeo_johnson_value(v, lambda) })
        .collect();
    scale(&transformed)
}

/// Box-Cox power transform followed by standardization.
///
/// Requires strictly positive data.
pub fn box_cox(values: &[f64]) -> Result<Vec<f64>, Rejected> {
    let data = present(values);
    if let Some(bad) = data.iter().find(|v| **v <= 0.0) {
        return Err(Rejected(format!(
            "Box-Cox needs strictly positive data, found {bad}"
        )));
    }
    let lambda = fit_box_cox(&data);
    let transformed: Vec<f64> = values
        .iter()
        .map(|&v| if v.is_nan() { v } else { box_cox_value(v, lambda) })
        .collect();
    Ok(scale(&transformed))
}

fn yeo_johnson_value(x: f64, lambda: f64) -> f64 {
    if x >= 0.0 {
        if lambda.abs() < f64::EPSILON {
            x.ln_1p()
        } else {
            ((x + 1.0).powf(lambda) - 1.0) / lambda
        }
    } else if (lambda - 2.0).abs() < f64::EPSILON {
        -(-x).ln_1p()
    } else {
        -((1.0 - x).powf(2.0 - lambda) - 1.0) / (2.0 - lambda)
    }
}

fn box_cox_value(x: f64, lambda: f64) -> f64 {
    if lambda.abs() < f64::EPSILON {
        x.ln()
    } else {
        (x.powf(lambda) - 1.0) / lambda
    }
}

fn variance(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

/// Maximum-likelihood lambda for Yeo-Johnson.
pub(crate) fn fit_yeo_johnson(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 1.0;
    }
    let n = data.len() as f64;
    let jacobian: f64 = data.iter().map(|x| x.signum() * x.abs().ln_1p()).sum();
    minimize(|lambda| {
        let transformed: Vec<f64> = data.iter().map(|x| yeo_johnson_value(*x, lambda)).collect();
        let var = variance(&transformed);
        if var <= f64::MIN_POSITIVE {
            return f64::INFINITY;
        }
        n / 2.0 * var.ln() - (lambda - 1.0) * jacobian
    })
}

/// Maximum-likelihood lambda for Box-Cox.
pub(crate) fn fit_box_cox(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 1.0;
    }
    let n = data.len() as f64;
    let log_sum: f64 = data.iter().map(|x| x.ln()).sum();
    minimize(|lambda| {
        let transformed: Vec<f64> = data.iter().map(|x| box_cox_value(*x, lambda)).collect();
        let var = variance(&transformed);
        if var <= f64::MIN_POSITIVE {
            return f64::INFINITY;
        }
        n / 2.0 * var.ln() - (lambda - 1.0) * log_sum
    })
}

/// Golden-section search for the minimum of `f` on [`LAMBDA_BOUNDS`].
fn minimize(f: impl Fn(f64) -> f64) -> f64 {
    let inv_phi = (5f64.sqrt() - 1.0) / 2.0;
    let (mut a, mut b) = LAMBDA_BOUNDS;
    let mut c = b - inv_phi * (b - a);
    let mut d = a + inv_phi * (b - a);
    let mut fc = f(c);
    let mut fd = f(d);
    for _ in 0..200 {
        if (b - a).abs() < 1e-9 {
            break;
        }
        if fc < fd {
            b = d;
            d = c;
            fd = fc;
            c = b - inv_phi * (b - a);
            fc = f(c);
        } else {
            a = c;
            c = d;
            fc = fd;
            d = a + inv_phi * (b - a);
            fd = f(d);
        }
    }
    (a + b) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use ehr_common::stats::{nan_mean, nan_std};

    fn skewed() -> Vec<f64> {
        vec![1.0, 1.5, 2.0, 2.2, 3.0, 4.5, 7.0, 12.0, 25.0, 60.0]
    }

    #[test]
    fn minimize_finds_parabola_vertex() {
        let x = minimize(|l| (l - 0.7).powi(2));
        assert!((x - 0.7).abs() < 1e-6);
    }

    #[test]
    fn yeo_johnson_standardizes_and_keeps_order() {
        let mut input = skewed();
        input.push(f64::NAN);
        let out = yeo_johnson(&input);
        assert!(out[10].is_nan());
        assert!(nan_mean(&out).abs() < 1e-9);
        assert!((nan_std(&out) - 1.0).abs() < 1e-9);
        assert!(out[..10].windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn right_skewed_data_gets_compressing_lambda() {
        assert!(fit_box_cox(&skewed()) < 1.0);
        assert!(fit_yeo_johnson(&skewed()) < 1.0);
    }

    #[test]
    fn box_cox_rejects_non_positive_data() {
        assert!(box_cox(&[1.0, 0.0, 2.0]).is_err());
        assert!(box_cox(&[1.0, -3.0]).is_err());
        let out = box_cox(&[1.0, f64::NAN, 2.0, 4.0]).expect("positive");
        assert!(out[1].is_nan());
    }

    #[test]
    fn yeo_johnson_value_matches_log_at_zero_lambda() {
        assert!((yeo_johnson_value(3.0, 0.0) - 4f64.ln()).abs() < 1e-12);
        assert!((yeo_johnson_value(-3.0, 2.0) + 4f64.ln()).abs() < 1e-12);
        assert!((yeo_johnson_value(3.0, 1.0) - 3.0).abs() < 1e-12);
        assert!((yeo_johnson_value(-3.0, 1.0) + 3.0).abs() < 1e-12);
    }
}
