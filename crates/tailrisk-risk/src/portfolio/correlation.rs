//! Pearson correlation and portfolio variance.

use super::{AlignedReturns, PortfolioError, min_eigenvalue};
use ndarray::{Array1, Array2, Axis};

/// Pearson correlation matrix of the columns of `values`.
///
/// The diagonal is exactly one. A column with zero variance leaves its
/// off-diagonal entries `NaN`. Off-diagonal entries are clamped to
/// `[-1, 1]` to absorb rounding overshoot.
pub fn correlation_matrix(values: &Array2<f64>) -> Result<Array2<f64>, PortfolioError> {
    let (rows, cols) = values.dim();
    if rows < 2 {
        return Err(PortfolioError::InsufficientOverlap {
            required: 2,
            actual: rows,
        });
    }

    let means = values
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::from_elem(cols, f64::NAN));
    let centered = values - &means.insert_axis(Axis(0));
    let cross = centered.t().dot(&centered);

    let mut corr = Array2::<f64>::eye(cols);
    for i in 0..cols {
        for j in (i + 1)..cols {
            let denom = (cross[[i, i]] * cross[[j, j]]).sqrt();
            let rho = if denom > 0.0 {
                (cross[[i, j]] / denom).clamp(-1.0, 1.0)
            } else {
                f64::NAN
            };
            corr[[i, j]] = rho;
            corr[[j, i]] = rho;
        }
    }

    Ok(corr)
}

/// Portfolio variance `wᵀ (σσᵀ ∘ ρ) w`.
///
/// Fails with [`PortfolioError::MalformedCorrelation`] when the result is
/// negative or `NaN`; the smallest eigenvalue of `corr` is attached.
pub fn portfolio_variance(
    weights: &Array1<f64>,
    sigmas: &Array1<f64>,
    corr: &Array2<f64>,
) -> Result<f64, PortfolioError> {
    let n = weights.len();
    if sigmas.len() != n {
        return Err(PortfolioError::DimensionMismatch {
            expected: n,
            actual: sigmas.len(),
        });
    }
    if corr.nrows() != n || corr.ncols() != n {
        return Err(PortfolioError::DimensionMismatch {
            expected: n,
            actual: corr.nrows().max(corr.ncols()),
        });
    }

    let scaled = weights * sigmas;
    let variance = scaled.dot(&corr.dot(&scaled));

    if variance.is_nan() || variance < 0.0 {
        return Err(PortfolioError::MalformedCorrelation {
            variance,
            min_eigenvalue: min_eigenvalue(corr)?,
        });
    }

    Ok(variance)
}

/// Weighted portfolio return on each aligned date, `Σ_i w_i r_i(t)`.
pub fn portfolio_returns(
    aligned: &AlignedReturns,
    weights: &Array1<f64>,
) -> Result<Array1<f64>, PortfolioError> {
    let cols = aligned.values().ncols();
    if weights.len() != cols {
        return Err(PortfolioError::DimensionMismatch {
            expected: cols,
            actual: weights.len(),
        });
    }
    Ok(aligned.values().dot(weights))
}
