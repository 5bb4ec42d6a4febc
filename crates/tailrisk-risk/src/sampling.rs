//! Random variate generation
//!
//! Standard normal, Gamma, chi-square and Student-t draws built on a uniform
//! source. Every generator is a free function over an injected [`Rng`]; none
//! keeps state between calls, so reproducibility is entirely a property of
//! the generator the caller passes in.

use rand::Rng;
use std::f64::consts::PI;

/// Uniform draw on the open interval `(0, 1)`.
///
/// Zero is rejected so the result is always safe to take the log of.
pub fn open_unit<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    loop {
        let u: f64 = rng.gen_range(0.0..1.0);
        if u > 0.0 {
            return u;
        }
    }
}

/// Standard normal draw via the Box–Muller transform.
pub fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u1 = open_unit(rng);
    let u2: f64 = rng.gen_range(0.0..1.0);
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

/// Gamma(`shape`, 1) draw.
///
/// Marsaglia–Tsang squeeze for `shape >= 1`. Smaller shapes are boosted with
/// `Gamma(k) = Gamma(k + 1) * U^(1/k)`. Returns `NaN` for a non-positive or
/// non-finite shape.
pub fn gamma<R: Rng + ?Sized>(shape: f64, rng: &mut R) -> f64 {
    if !(shape > 0.0 && shape.is_finite()) {
        return f64::NAN;
    }

    if shape < 1.0 {
        let u = open_unit(rng);
        return gamma(shape + 1.0, rng) * u.powf(1.0 / shape);
    }

    let d = shape - 1.0 / 3.0;
    let c = 1.0 / (9.0 * d).sqrt();

    loop {
        let (x, v) = loop {
            let x = standard_normal(rng);
            let v = 1.0 + c * x;
            if v > 0.0 {
                break (x, v * v * v);
            }
        };

        let u = open_unit(rng);
        let x2 = x * x;
        if u < 1.0 - 0.0331 * x2 * x2 {
            return d * v;
        }
        if u.ln() < 0.5 * x2 + d * (1.0 - v + v.ln()) {
            return d * v;
        }
    }
}

/// Chi-square draw with `df` degrees of freedom, `2 * Gamma(df / 2, 1)`.
pub fn chi_square<R: Rng + ?Sized>(df: f64, rng: &mut R) -> f64 {
    2.0 * gamma(df / 2.0, rng)
}

/// Standard Student-t draw, `Z / sqrt(ChiSquare(df) / df)`.
///
/// The draw has unit scale, not unit variance; its variance is
/// `df / (df - 2)` for `df > 2`.
pub fn student_t<R: Rng + ?Sized>(df: f64, rng: &mut R) -> f64 {
    let z = standard_normal(rng);
    let chi = chi_square(df, rng);
    z / (chi / df).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{mean, std};
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rstest::rstest;

    const N: usize = 100_000;

    fn draws(mut f: impl FnMut(&mut StdRng) -> f64, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..N).map(|_| f(&mut rng)).collect()
    }

    #[test]
    fn test_open_unit_bounds() {
        let sample = draws(|rng| open_unit(rng), 1);
        assert!(sample.iter().all(|&u| u > 0.0 && u < 1.0));
    }

    #[test]
    fn test_standard_normal_moments() {
        let sample = draws(|rng| standard_normal(rng), 7);
        assert_abs_diff_eq!(mean(&sample), 0.0, epsilon = 0.02);
        assert_abs_diff_eq!(std(&sample), 1.0, epsilon = 0.02);
    }

    #[rstest]
    #[case(0.5)]
    #[case(1.0)]
    #[case(3.0)]
    #[case(12.5)]
    fn test_gamma_moments(#[case] shape: f64) {
        let sample = draws(|rng| gamma(shape, rng), 11);
        assert!(sample.iter().all(|&g| g > 0.0));
        // Gamma(k, 1) has mean k and variance k
        assert_abs_diff_eq!(mean(&sample), shape, epsilon = 0.05 * shape.max(1.0));
        assert_abs_diff_eq!(std(&sample).powi(2), shape, epsilon = 0.1 * shape.max(1.0));
    }

    #[test]
    fn test_gamma_invalid_shape() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!(gamma(0.0, &mut rng).is_nan());
        assert!(gamma(-2.0, &mut rng).is_nan());
    }

    #[test]
    fn test_chi_square_mean() {
        let sample = draws(|rng| chi_square(6.0, rng), 5);
        assert_abs_diff_eq!(mean(&sample), 6.0, epsilon = 0.1);
    }

    #[test]
    fn test_student_t_variance() {
        let df = 8.0;
        let sample = draws(|rng| student_t(df, rng), 13);
        assert_abs_diff_eq!(mean(&sample), 0.0, epsilon = 0.03);
        assert_abs_diff_eq!(std(&sample).powi(2), df / (df - 2.0), epsilon = 0.1);
    }
}
