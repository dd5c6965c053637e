use ehr_common::stats::{quantile_sorted, sorted_present};

/// Upper bound on the number of quantiles used to estimate the CDF.
pub const MAX_QUANTILES: usize = 1000;
/// Values within this distance of the outermost quantiles map to the bounds.
const BOUNDS_THRESHOLD: f64 = 1e-7;

/// Maps values through their empirical CDF onto `[0, 1]`.
pub fn quantile_uniform(values: &[f64]) -> Vec<f64> {
    transform(values, Target::Uniform)
}

/// Maps values through their empirical CDF onto a standard normal.
pub fn quantile_normal(values: &[f64]) -> Vec<f64> {
    transform(values, Target::Normal)
}

#[derive(Clone, Copy, PartialEq)]
enum Target {
    Uniform,
    Normal,
}

fn transform(values: &[f64], target: Target) -> Vec<f64> {
    let sorted = sorted_present(values);
    if sorted.is_empty() {
        return values.to_vec();
    }
    let n_quantiles = sorted.len().min(MAX_QUANTILES);
    let references = linspace(n_quantiles);
    let quantiles: Vec<f64> = references
        .iter()
        .map(|r| quantile_sorted(&sorted, *r))
        .collect();
    let neg_quantiles: Vec<f64> = quantiles.iter().rev().map(|q| -q).collect();
    let neg_references: Vec<f64> = references.iter().rev().map(|r| -r).collect();

    let lower = quantiles[0];
    let upper = quantiles[quantiles.len() - 1];
    let clip_lo = inverse_normal_cdf(BOUNDS_THRESHOLD);
    let clip_hi = inverse_normal_cdf(1.0 - BOUNDS_THRESHOLD);

    values
        .iter()
        .map(|&x| {
            if x.is_nan() {
                return x;
            }
            let (at_lower, at_upper) = match target {
                Target::Uniform => (x == lower, x == upper),
                Target::Normal => (x - BOUNDS_THRESHOLD < lower, x + BOUNDS_THRESHOLD > upper),
            };
            let p = if at_upper {
                1.0
            } else if at_lower {
                0.0
            } else {
                0.5 * (interp(x, &quantiles, &references) - interp(-x, &neg_quantiles, &neg_references))
            };
            match target {
                Target::Uniform => p,
                Target::Normal => inverse_normal_cdf(p).clamp(clip_lo, clip_hi),
            }
        })
        .collect()
}

fn linspace(n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![0.0];
    }
    (0..n).map(|i| i as f64 / (n - 1) as f64).collect()
}

/// Piecewise-linear interpolation over increasing `xp`, clamped at the ends.
fn interp(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    let last = xp.len() - 1;
    if x <= xp[0] {
        return fp[0];
    }
    if x >= xp[last] {
        return fp[last];
    }
    let j = xp.partition_point(|v| *v <= x) - 1;
    let (x0, x1) = (xp[j], xp[j + 1]);
    fp[j] + (fp[j + 1] - fp[j]) * (x - x0) / (x1 - x0)
}

/// Inverse of the standard normal CDF (Acklam's rational approximation).
pub(crate) fn inverse_normal_cdf(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969_683_028_665_376e1,
        2.209_460_984_245_205e2,
        -2.759_285_104_469_687e2,
        1.383_577_518_672_69e2,
        -3.066_479_806_614_716e1,
        2.506_628_277_459_239,
    ];
    const B: [f64; 5] = [
        -5.447_609_879_822_406e1,
        1.615_858_368_580_409e2,
        -1.556_989_798_598_866e2,
        6.680_131_188_771_972e1,
        -1.328_068_155_288_572e1,
    ];
    const C: [f64; 6] = [
        -7.784_894_002_430_293e-3,
        -3.223_964_580_411_365e-1,
        -2.400_758_277_161_838,
        -2.549_732_539_343_734,
        4.374_664_141_464_968,
        2.938_163_982_698_783,
    ];
    const D: [f64; 4] = [
        7.784_695_709_041_462e-3,
        3.224_671_290_700_398e-1,
        2.445_134_137_142_996,
        3.754_408_661_907_416,
    ];
    const P_LOW: f64 = 0.02425;

    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }
    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -inverse_normal_cdf(1.0 - p)
    }
}
