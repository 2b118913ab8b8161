//! Post-processing of assembled inverse estimates.
//!
//! Independent column solves give a matrix that is neither symmetric nor
//! guaranteed to have a positive diagonal. [`symmetrize`] fixes the first,
//! [`correct_diagonal`] the second. Both are pure and leave an already
//! symmetric, positive-diagonal matrix untouched.

use ndarray::{Array1, Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::{LrpcError, Result};
use crate::utils::linalg::{left_svd, rank_tolerance};

/// Rule used to combine an estimate with its transpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Symmetrize {
    /// Keep the entry of smaller absolute value, with its sign
    Min,

    /// Keep the entry of larger absolute value, with its sign
    Max,

    /// Elementwise mean of the matrix and its transpose
    Avg,

    /// Leave the matrix as assembled
    None,
}

impl Default for Symmetrize {
    fn default() -> Self {
        Symmetrize::Min
    }
}

/// Combine `d` with its transpose under `rule`.
///
/// For `Min`, `Max` and `Avg` the output is exactly symmetric: each pair
/// `(i, j)`, `(j, i)` is decided once and written to both positions. Ties in
/// absolute value resolve to the upper-triangular entry.
pub fn symmetrize(d: &Array2<f64>, rule: Symmetrize) -> Result<Array2<f64>> {
    let (rows, cols) = d.dim();
    if rows != cols {
        return Err(LrpcError::DimensionMismatch(format!(
            "Cannot symmetrize a {}x{} matrix",
            rows, cols
        )));
    }

    if rule == Symmetrize::None {
        return Ok(d.clone());
    }

    let mut out = d.clone();
    for i in 0..rows {
        for j in (i + 1)..cols {
            let upper = d[[i, j]];
            let lower = d[[j, i]];
            let value = match rule {
                Symmetrize::Min => {
                    if upper.abs() <= lower.abs() {
                        upper
                    } else {
                        lower
                    }
                }
                Symmetrize::Max => {
                    if upper.abs() >= lower.abs() {
                        upper
                    } else {
                        lower
                    }
                }
                Symmetrize::Avg => 0.5 * (upper + lower),
                Symmetrize::None => upper,
            };
            out[[i, j]] = value;
            out[[j, i]] = value;
        }
    }

    Ok(out)
}

/// Diagonal of the Moore–Penrose pseudo-inverse of `gamma`.
///
/// With `gamma = U Σ Vᵗ`, returns `diag(U Σ⁺ Uᵗ)` where `Σ⁺` inverts the
/// singular values above the rank tolerance and zeroes the rest. For the
/// symmetric positive semi-definite targets used here `U = V`.
pub fn pseudo_inverse_diagonal(gamma: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
    let (u, sigma) = left_svd(gamma)?;
    let p = sigma.len();
    let sigma_max = sigma.iter().fold(0.0_f64, |acc, &s| acc.max(s));
    let tol = rank_tolerance(p, sigma_max);

    let inv_sigma = sigma.mapv(|s| if s > tol { 1.0 / s } else { 0.0 });

    let diag = Array1::from_shape_fn(p, |i| {
        (0..p)
            .map(|k| u[[i, k]] * u[[i, k]] * inv_sigma[k])
            .sum::<f64>()
    });

    Ok(diag)
}

/// Indices of diagonal entries that are not strictly positive (or not finite).
pub fn non_positive_diagonal(d: &Array2<f64>) -> Vec<usize> {
    d.diag()
        .iter()
        .enumerate()
        .filter(|(_, &v)| !(v > 0.0))
        .map(|(i, _)| i)
        .collect()
}

/// Replace non-positive diagonal entries of `d` by the pseudo-inverse
/// diagonal of `gamma`.
///
/// A replacement value that is itself not strictly positive (the coordinate
/// lies in the null space of `gamma`) falls back to the smallest strictly
/// positive pseudo-inverse diagonal entry, so the returned diagonal is strictly
/// positive whenever `gamma` has a positive singular value.
///
/// This repairs the diagonal only. It does not bound the induced partial
/// correlations by one in absolute value.
///
/// # Returns
///
/// * The corrected matrix and the indices that were replaced
pub fn correct_diagonal(
    d: &Array2<f64>,
    gamma: ArrayView2<'_, f64>,
) -> Result<(Array2<f64>, Vec<usize>)> {
    if d.dim() != gamma.dim() {
        return Err(LrpcError::DimensionMismatch(format!(
            "Estimate is {:?} but target is {:?}",
            d.dim(),
            gamma.dim()
        )));
    }

    let replaced = non_positive_diagonal(d);
    if replaced.is_empty() {
        return Ok((d.clone(), replaced));
    }

    let pinv_diag = pseudo_inverse_diagonal(gamma)?;
    let floor = pinv_diag
        .iter()
        .copied()
        .filter(|v| *v > 0.0 && v.is_finite())
        .fold(f64::INFINITY, f64::min);
    if !floor.is_finite() {
        return Err(LrpcError::LinearAlgebraError(
            "target matrix has no positive singular value".to_string(),
        ));
    }

    let mut out = d.clone();
    for &i in &replaced {
        let value = pinv_diag[i];
        out[[i, i]] = if value > 0.0 && value.is_finite() {
            value
        } else {
            floor
        };
    }

    log::warn!(
        "replaced {} non-positive diagonal entries with pseudo-inverse values: {:?}",
        replaced.len(),
        replaced
    );

    Ok((out, replaced))
}
