//! Symmetric eigenvalues by cyclic Jacobi rotation.
//!
//! Only used to describe a correlation matrix that produced an invalid
//! portfolio variance, so eigenvectors are not tracked.

use super::PortfolioError;
use ndarray::{Array1, Array2};

const MAX_ROTATIONS_PER_ENTRY: usize = 50;
const OFF_DIAGONAL_TOLERANCE: f64 = 1e-12;

/// Eigenvalues of a symmetric matrix, sorted in descending order.
///
/// Non-finite entries produce an all-NaN result rather than an error.
pub fn symmetric_eigenvalues(matrix: &Array2<f64>) -> Result<Array1<f64>, PortfolioError> {
    let n = matrix.nrows();
    if n != matrix.ncols() {
        return Err(PortfolioError::DimensionMismatch {
            expected: n,
            actual: matrix.ncols(),
        });
    }
    if matrix.iter().any(|v| !v.is_finite()) {
        return Ok(Array1::from_elem(n, f64::NAN));
    }

    let mut a = matrix.clone();
    if n > 1 {
        for _ in 0..MAX_ROTATIONS_PER_ENTRY * n * n {
            let (p, q, apq) = largest_off_diagonal(&a);
            if apq.abs() < OFF_DIAGONAL_TOLERANCE {
                break;
            }
            let (cos_theta, sin_theta) = rotation(a[[p, p]], a[[q, q]], apq);
            rotate(&mut a, p, q, cos_theta, sin_theta);
        }
    }

    let mut eigenvalues: Vec<f64> = a.diag().to_vec();
    eigenvalues.sort_by(|x, y| y.total_cmp(x));
    Ok(Array1::from(eigenvalues))
}

/// Smallest eigenvalue of a symmetric matrix, NaN if it has non-finite entries.
pub fn min_eigenvalue(matrix: &Array2<f64>) -> Result<f64, PortfolioError> {
    let eigenvalues = symmetric_eigenvalues(matrix)?;
    Ok(eigenvalues.last().copied().unwrap_or(f64::NAN))
}

fn largest_off_diagonal(a: &Array2<f64>) -> (usize, usize, f64) {
    let n = a.nrows();
    let (mut p, mut q, mut max_abs) = (0, 1, 0.0);
    for i in 0..n {
        for j in (i + 1)..n {
            let v = a[[i, j]].abs();
            if v > max_abs {
                max_abs = v;
                p = i;
                q = j;
            }
        }
    }
    (p, q, a[[p, q]])
}

fn rotation(app: f64, aqq: f64, apq: f64) -> (f64, f64) {
    let tau = (aqq - app) / (2.0 * apq);
    let t = if tau >= 0.0 {
        1.0 / (tau + (1.0 + tau * tau).sqrt())
    } else {
        -1.0 / (-tau + (1.0 + tau * tau).sqrt())
    };
    let cos_theta = 1.0 / (1.0 + t * t).sqrt();
    (cos_theta, t * cos_theta)
}

fn rotate(a: &mut Array2<f64>, p: usize, q: usize, c: f64, s: f64) {
    let app = a[[p, p]];
    let aqq = a[[q, q]];
    let apq = a[[p, q]];

    a[[p, p]] = c * c * app - 2.0 * c * s * apq + s * s * aqq;
    a[[q, q]] = s * s * app + 2.0 * c * s * apq + c * c * aqq;
    a[[p, q]] = 0.0;
    a[[q, p]] = 0.0;

    for i in 0..a.nrows() {
        if i == p || i == q {
            continue;
        }
        let aip = a[[i, p]];
        let aiq = a[[i, q]];
        a[[i, p]] = c * aip - s * aiq;
        a[[p, i]] = a[[i, p]];
        a[[i, q]] = s * aip + c * aiq;
        a[[q, i]] = a[[i, q]];
    }
}
