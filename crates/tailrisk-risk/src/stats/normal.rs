//! Inverse standard-normal CDF (z-score) via Moro's approximation.
//!
//! The central region `|c - 0.5| < 0.42` uses a rational function in
//! `y = c - 0.5`; the tails use a Chebyshev-style polynomial in
//! `ln(-ln(tail))`. The two conventional desk constants for 95% and 99% are
//! returned exactly so closed-form results line up with published tables.

const MORO_A: [f64; 4] = [
    2.50662823884,
    -18.61500062529,
    41.39119773534,
    -25.44106049637,
];

const MORO_B: [f64; 4] = [
    -8.47351093090,
    23.08336743743,
    -21.06224101826,
    3.13082909833,
];

const MORO_C: [f64; 9] = [
    0.3374754822726147,
    0.9761690190917186,
    0.1607979714918209,
    0.0276438810333863,
    0.0038405729373609,
    0.0003951896511919,
    0.0000321767881768,
    0.0000002888167364,
    0.0000003960315187,
];

const EXACT_TOLERANCE: f64 = 1e-6;

/// z-score such that `P(Z <= z) = confidence` for a standard normal `Z`.
///
/// `0.95` maps to exactly `1.645` and `0.99` to exactly `2.33`. Returns `NaN`
/// outside the open interval `(0, 1)`.
pub fn z_from_confidence(confidence: f64) -> f64 {
    if !(confidence > 0.0 && confidence < 1.0) {
        return f64::NAN;
    }
    if (confidence - 0.95).abs() < EXACT_TOLERANCE {
        return 1.645;
    }
    if (confidence - 0.99).abs() < EXACT_TOLERANCE {
        return 2.33;
    }

    let y = confidence - 0.5;
    if y.abs() < 0.42 {
        let r = y * y;
        let num = y * (((MORO_A[3] * r + MORO_A[2]) * r + MORO_A[1]) * r + MORO_A[0]);
        let den = (((MORO_B[3] * r + MORO_B[2]) * r + MORO_B[1]) * r + MORO_B[0]) * r + 1.0;
        return num / den;
    }

    let tail = if y <= 0.0 { confidence } else { 1.0 - confidence };
    let r = (-tail.ln()).ln();

    let mut x = MORO_C[0];
    let mut power = 1.0;
    for &c in &MORO_C[1..] {
        power *= r;
        x += c * power;
    }

    if y > 0.0 { x } else { -x }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    #[test]
    fn test_exact_desk_constants() {
        assert_eq!(z_from_confidence(0.95), 1.645);
        assert_eq!(z_from_confidence(0.99), 2.33);
        assert_eq!(z_from_confidence(0.9500000001), 1.645);
    }

    #[test]
    fn test_median_is_zero() {
        assert_eq!(z_from_confidence(0.5), 0.0);
    }

    #[rstest]
    #[case(0.975, 1.959_964)]
    #[case(0.9, 1.281_552)]
    #[case(0.8, 0.841_621)]
    #[case(0.999, 3.090_232)]
    #[case(0.025, -1.959_964)]
    fn test_known_quantiles(#[case] confidence: f64, #[case] expected: f64) {
        assert_abs_diff_eq!(z_from_confidence(confidence), expected, epsilon = 1e-4);
    }

    #[rstest]
    #[case(0.6)]
    #[case(0.9)]
    #[case(0.925)]
    #[case(0.975)]
    #[case(0.995)]
    #[case(0.9999)]
    fn test_symmetry(#[case] confidence: f64) {
        assert_abs_diff_eq!(
            z_from_confidence(1.0 - confidence),
            -z_from_confidence(confidence),
            epsilon = 1e-4
        );
    }

    #[test]
    fn test_out_of_range() {
        assert!(z_from_confidence(0.0).is_nan());
        assert!(z_from_confidence(1.0).is_nan());
        assert!(z_from_confidence(f64::NAN).is_nan());
    }
}
