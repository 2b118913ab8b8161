//! Matrix conversion utilities for the lrpc-rs library.
//!
//! Public matrices are `ndarray` arrays; decompositions run on `faer`
//! matrices. These helpers copy between the two layouts.

use faer::{Mat, MatRef};
use ndarray::{Array2, ArrayView2};

/// Convert an ndarray view to a faer Mat.
///
/// # Arguments
///
/// * `arr` - The ndarray matrix (or view) to convert
///
/// # Returns
///
/// * A faer Mat with the same data
pub fn ndarray_to_faer(arr: ArrayView2<'_, f64>) -> Mat<f64> {
    let (rows, cols) = arr.dim();
    // ndarray is row-major by default, faer is column-major
    Mat::from_fn(rows, cols, |i, j| arr[[i, j]])
}

/// Convert a faer matrix to an ndarray Array2.
///
/// # Arguments
///
/// * `mat` - The faer MatRef to convert
///
/// # Returns
///
/// * An ndarray Array2 with the same data
pub fn faer_to_ndarray(mat: MatRef<'_, f64>) -> Array2<f64> {
    Array2::from_shape_fn((mat.nrows(), mat.ncols()), |(i, j)| mat[(i, j)])
}
