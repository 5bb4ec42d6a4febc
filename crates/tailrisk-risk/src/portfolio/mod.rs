//! Portfolio aggregation
//!
//! Aligns member return series on their common dates, estimates the Pearson
//! correlation matrix and combines per-instrument volatilities into a
//! portfolio variance:
//!
//! σ_p² = Σ_i Σ_j w_i w_j σ_i σ_j ρ_ij
//!
//! Nothing here repairs a malformed correlation matrix. A negative or
//! undefined variance is reported with the matrix's smallest eigenvalue so
//! the caller can see why.

pub mod align;
pub mod correlation;
pub mod eigen;

pub use align::{AlignedReturns, align_returns};
pub use correlation::{correlation_matrix, portfolio_returns, portfolio_variance};
pub use eigen::{min_eigenvalue, symmetric_eigenvalues};

use ndarray::Array1;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Errors that can occur during portfolio aggregation
#[derive(Debug, Error)]
pub enum PortfolioError {
    /// Too few aligned rows to estimate a correlation
    #[error("Insufficient overlap: need at least {required} aligned observations, got {actual}")]
    InsufficientOverlap {
        /// Required number of rows
        required: usize,
        /// Rows remaining after alignment and cleaning
        actual: usize,
    },

    /// Portfolio with fewer than two instruments
    #[error("Portfolio needs at least 2 instruments, got {0}")]
    TooFewInstruments(usize),

    /// Weights missing, non-numeric or not summing to a positive total
    #[error("Invalid portfolio weights: {0}")]
    InvalidWeights(String),

    /// Instrument referenced but not supplied
    #[error("Unknown instrument: {0}")]
    UnknownInstrument(String),

    /// The same instrument supplied twice
    #[error("Duplicate instrument: {0}")]
    DuplicateInstrument(String),

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// Portfolio variance came out negative or undefined
    #[error("Malformed correlation matrix: variance {variance}, min eigenvalue {min_eigenvalue}")]
    MalformedCorrelation {
        /// The offending variance
        variance: f64,
        /// Smallest eigenvalue of the correlation matrix (NaN if undefined)
        min_eigenvalue: f64,
    },
}

/// Instruments and normalized weights of a portfolio.
///
/// Instrument ids are kept in sorted order and weights follow that order.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioSpec {
    ids: Vec<String>,
    weights: Array1<f64>,
}

impl PortfolioSpec {
    /// Build a portfolio from instrument ids and optional raw weights.
    ///
    /// With `weights = None` every instrument gets the same weight. Once any
    /// weights are supplied they must cover every instrument, be finite and
    /// strictly positive; they are then normalized to sum to one.
    pub fn new<I, S>(
        ids: I,
        weights: Option<&BTreeMap<String, f64>>,
    ) -> Result<Self, PortfolioError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let unique: BTreeSet<String> = ids.into_iter().map(Into::into).collect();
        if unique.len() < 2 {
            return Err(PortfolioError::TooFewInstruments(unique.len()));
        }
        let ids: Vec<String> = unique.into_iter().collect();

        let Some(raw) = weights else {
            let n = ids.len();
            return Ok(Self {
                ids,
                weights: Array1::from_elem(n, 1.0 / n as f64),
            });
        };

        if let Some(extra) = raw.keys().find(|k| !ids.contains(k)) {
            return Err(PortfolioError::InvalidWeights(format!(
                "weight given for instrument {} which is not in the portfolio",
                extra
            )));
        }

        let mut values = Vec::with_capacity(ids.len());
        for id in &ids {
            let w = raw.get(id).copied().ok_or_else(|| {
                PortfolioError::InvalidWeights(format!("missing weight for {}", id))
            })?;
            if !w.is_finite() {
                return Err(PortfolioError::InvalidWeights(format!(
                    "weight for {} is not a finite number",
                    id
                )));
            }
            if w <= 0.0 {
                return Err(PortfolioError::InvalidWeights(format!(
                    "weight for {} must be positive, got {}",
                    id, w
                )));
            }
            values.push(w);
        }

        let total: f64 = values.iter().sum();
        if !(total > 0.0) {
            return Err(PortfolioError::InvalidWeights(format!(
                "weights sum to {}, must be positive",
                total
            )));
        }

        Ok(Self {
            ids,
            weights: Array1::from_vec(values) / total,
        })
    }

    /// Instrument ids in weight order
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Normalized weights, summing to one
    pub const fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    /// Weight of one instrument
    pub fn weight(&self, id: &str) -> Option<f64> {
        self.ids
            .iter()
            .position(|i| i == id)
            .map(|idx| self.weights[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn weights(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_equal_weights_when_omitted() {
        let spec = PortfolioSpec::new(["B", "A", "C"], None).unwrap();
        assert_eq!(spec.ids(), &["A", "B", "C"]);
        for &w in spec.weights() {
            assert_abs_diff_eq!(w, 1.0 / 3.0, epsilon = 1e-15);
        }
    }

    #[test]
    fn test_weights_normalized() {
        let w = weights(&[("A", 3.0), ("B", 2.0)]);
        let spec = PortfolioSpec::new(["A", "B"], Some(&w)).unwrap();
        assert_abs_diff_eq!(spec.weight("A").unwrap(), 0.6, epsilon = 1e-15);
        assert_abs_diff_eq!(spec.weight("B").unwrap(), 0.4, epsilon = 1e-15);
    }

    #[test]
    fn test_partial_weights_rejected() {
        let err = PortfolioSpec::new(["A", "B"], Some(&weights(&[("A", 1.0)])));
        assert!(matches!(err, Err(PortfolioError::InvalidWeights(msg)) if msg.contains("B")));
    }

    #[test]
    fn test_non_positive_and_nan_weights_rejected() {
        let zero = weights(&[("A", 1.0), ("B", 0.0)]);
        assert!(PortfolioSpec::new(["A", "B"], Some(&zero)).is_err());
        let negative = weights(&[("A", 1.0), ("B", -0.5)]);
        assert!(PortfolioSpec::new(["A", "B"], Some(&negative)).is_err());
        assert!(
            PortfolioSpec::new(["A", "B"], Some(&weights(&[("A", f64::NAN), ("B", 1.0)]))).is_err()
        );
    }

    #[test]
    fn test_unknown_weight_key_rejected() {
        let err = PortfolioSpec::new(
            ["A", "B"],
            Some(&weights(&[("A", 1.0), ("B", 1.0), ("Z", 1.0)])),
        );
        assert!(matches!(err, Err(PortfolioError::InvalidWeights(_))));
    }

    #[test]
    fn test_single_instrument_rejected() {
        assert!(matches!(
            PortfolioSpec::new(["A", "A"], None),
            Err(PortfolioError::TooFewInstruments(1))
        ));
    }
}
