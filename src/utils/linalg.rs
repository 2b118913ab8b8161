//! Dense decompositions used by the repair utilities and the CV loss.
//!
//! Everything here goes through faer's SVD; callers pass and receive
//! `ndarray` types.

use ndarray::{Array1, Array2, ArrayView2};

use crate::error::{LrpcError, Result};
use crate::utils::matrix_convert::{faer_to_ndarray, ndarray_to_faer};

/// Singular values of `m` in non-increasing order.
pub fn singular_values(m: ArrayView2<'_, f64>) -> Result<Vec<f64>> {
    if m.iter().any(|v| !v.is_finite()) {
        return Err(LrpcError::LinearAlgebraError(
            "SVD input contains non-finite entries".to_string(),
        ));
    }

    let mat = ndarray_to_faer(m);
    let mut values = mat
        .as_ref()
        .singular_values()
        .map_err(|err| LrpcError::LinearAlgebraError(format!("SVD failed: {err:?}")))?;

    values.sort_by(|a, b| b.total_cmp(a));
    Ok(values)
}

/// Left singular vectors and singular values of a square matrix.
///
/// # Returns
///
/// * `(U, sigma)` with `m = U * diag(sigma) * V^T`
pub fn left_svd(m: ArrayView2<'_, f64>) -> Result<(Array2<f64>, Array1<f64>)> {
    let (rows, cols) = m.dim();
    if rows != cols {
        return Err(LrpcError::DimensionMismatch(format!(
            "Expected a square matrix, got {}x{}",
            rows, cols
        )));
    }
    if m.iter().any(|v| !v.is_finite()) {
        return Err(LrpcError::LinearAlgebraError(
            "SVD input contains non-finite entries".to_string(),
        ));
    }

    let mat = ndarray_to_faer(m);
    let svd = mat
        .as_ref()
        .svd()
        .map_err(|err| LrpcError::LinearAlgebraError(format!("SVD failed: {err:?}")))?;

    let u = faer_to_ndarray(svd.U());
    let s = svd.S();
    let sigma = Array1::from_shape_fn(rows, |k| s[k]);

    Ok((u, sigma))
}

/// Default rank tolerance for a matrix with the given singular values.
pub fn rank_tolerance(dim: usize, sigma_max: f64) -> f64 {
    dim.max(1) as f64 * sigma_max * f64::EPSILON
}
