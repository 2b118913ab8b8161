//! Candidate paths and fold layout.

use ndarray::Array1;
use std::ops::Range;

use crate::error::{LrpcError, Result};

/// Ratio of the smallest to the largest candidate on a path.
const PATH_FLOOR_RATIO: f64 = 0.01;

/// `length` values log-spaced from `top` down to `0.01 · top`.
pub fn log_path(top: f64, length: usize) -> Result<Vec<f64>> {
    if length == 0 {
        return Err(LrpcError::InvalidConfig(
            "path length must be positive".to_string(),
        ));
    }
    if !top.is_finite() || top <= 0.0 {
        return Err(LrpcError::InvalidInput(format!(
            "path needs a positive finite upper end, got {}",
            top
        )));
    }
    if length == 1 {
        return Ok(vec![top]);
    }

    Array1::geomspace(top, top * PATH_FLOOR_RATIO, length)
        .map(|a| a.to_vec())
        .ok_or_else(|| LrpcError::InvalidInput(format!("cannot build a log path below {}", top)))
}

/// Training and validation ranges for `n_folds` contiguous blocks of `0..n`.
///
/// Block sizes differ by at most one. Within a block of length `m` the first
/// `⌈m/2⌉` indices train and the remaining ones validate. Every half must
/// hold at least `min_len` indices.
pub fn fold_splits(
    n: usize,
    n_folds: usize,
    min_len: usize,
) -> Result<Vec<(Range<usize>, Range<usize>)>> {
    if n_folds == 0 {
        return Err(LrpcError::InvalidConfig(
            "number of folds must be positive".to_string(),
        ));
    }

    let mut folds = Vec::with_capacity(n_folds);
    for k in 0..n_folds {
        let start = k * n / n_folds;
        let end = (k + 1) * n / n_folds;
        let split = start + (end - start + 1) / 2;

        let train = start..split;
        let test = split..end;
        if train.len() < min_len || test.len() < min_len {
            return Err(LrpcError::InvalidConfig(format!(
                "{} folds over {} observations leave fold {} with {} training and {} validation points; need {}",
                n_folds,
                n,
                k,
                train.len(),
                test.len(),
                min_len
            )));
        }
        folds.push((train, test));
    }

    Ok(folds)
}
