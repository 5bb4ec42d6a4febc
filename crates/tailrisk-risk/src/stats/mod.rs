//! Statistical primitives
//!
//! Sample moments, trailing-window volatility, the inverse-normal z-score
//! and the linear empirical quantile. These functions are total: when the
//! input cannot support an estimate they return `NaN` instead of failing, so
//! callers decide whether an undefined value is an error.

pub mod normal;

pub use normal::z_from_confidence;

/// Finite values of `values`, in order.
pub fn finite_values(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| v.is_finite()).collect()
}

/// Arithmetic mean; `NaN` for an empty sample.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation with Bessel's correction (n - 1).
///
/// Returns `NaN` when fewer than two values are supplied.
pub fn std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }

    let mu = mean(values);
    let sum_sq = values.iter().map(|&x| (x - mu).powi(2)).sum::<f64>();
    (sum_sq / (n as f64 - 1.0)).sqrt()
}

/// Volatility of the trailing `window` finite returns.
///
/// Non-finite values are dropped first. If fewer than `window` finite returns
/// remain the whole finite history is used, so a short history still gets a
/// full-sample estimate instead of an undefined one.
pub fn rolling_sigma(returns: &[f64], window: usize) -> f64 {
    let finite = finite_values(returns);
    let start = finite.len().saturating_sub(window);
    std(&finite[start..])
}

/// Linear-interpolation quantile of a sample.
///
/// Sorts a copy of the sample and interpolates between the order statistics
/// around the fractional rank `(n - 1) * q`. Returns `NaN` for an empty sample
/// or `q` outside `[0, 1]`.
pub fn empirical_quantile(sample: &[f64], q: f64) -> f64 {
    let mut sorted = sample.to_vec();
    empirical_quantile_in_place(&mut sorted, q)
}

/// Same as [`empirical_quantile`] but sorts `sample` in place.
///
/// Used by the simulation kernel to avoid copying large samples.
pub fn empirical_quantile_in_place(sample: &mut [f64], q: f64) -> f64 {
    if sample.is_empty() || !(0.0..=1.0).contains(&q) {
        return f64::NAN;
    }

    sample.sort_unstable_by(f64::total_cmp);

    let rank = (sample.len() - 1) as f64 * q;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;

    sample[lo] + frac * (sample[hi] - sample[lo])
}
