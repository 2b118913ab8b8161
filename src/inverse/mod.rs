//! Sparse inverse estimation by column-wise constrained L1 minimization.
//!
//! Each column of the estimate solves its own linear program (see
//! [`column`]); the [`DirectInverse`] estimator uses a uniform tolerance and
//! the [`AdaptiveInverse`] estimator rescales the tolerance per column from a
//! pilot pass. Both finish with the repairs in [`repair`].

pub mod adaptive;
pub mod column;
pub mod config;
pub mod direct;
pub mod repair;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{LrpcError, Result};
use crate::utils::parallel::WorkerPool;

pub use adaptive::AdaptiveInverse;
pub use column::ColumnProblem;
pub use config::{AdaptiveOptions, InverseConfig};
pub use direct::DirectInverse;
pub use repair::{correct_diagonal, pseudo_inverse_diagonal, symmetrize, Symmetrize};

/// A data-quality issue found in an estimate that was not repaired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataQualityWarning {
    /// Diagonal entries that are not strictly positive. Normalizing the
    /// matrix into partial correlations yields NaN for these indices.
    NonPositiveDiagonal {
        /// Which matrix the warning refers to
        matrix: String,
        /// Offending diagonal indices
        indices: Vec<usize>,
    },
}

impl fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataQualityWarning::NonPositiveDiagonal { matrix, indices } => write!(
                f,
                "{} has non-positive diagonal entries at {:?}",
                matrix, indices
            ),
        }
    }
}

/// Result of one inverse estimation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InverseEstimate {
    /// The symmetrized (and possibly corrected) estimate
    pub matrix: Array2<f64>,

    /// Regularization value used for the final columns
    pub eta: f64,

    /// Symmetrization rule applied
    pub symmetrize: Symmetrize,

    /// Diagonal indices replaced by the pseudo-inverse fallback
    pub corrected: Vec<usize>,

    /// Unrepaired data-quality issues
    pub warnings: Vec<DataQualityWarning>,

    /// Pilot diagonal estimates (adaptive estimator only)
    pub pilot: Option<Array1<f64>>,

    /// Pilot-stage regularization (adaptive estimator only)
    pub eta_adaptive: Option<f64>,
}

/// Common interface of the inverse estimators.
///
/// The cross-validator is generic over this trait so that the same path
/// search drives either estimator.
pub trait InverseEstimator: Sync {
    /// Estimate the inverse of `gamma` on an existing worker pool.
    ///
    /// # Arguments
    ///
    /// * `pool` - Worker pool running the column problems
    /// * `gamma` - Square target matrix
    /// * `eta` - Regularization value; `None` selects the estimator's default
    ///   where it has one
    /// * `n_obs` - Number of observations behind `gamma`
    fn estimate_in(
        &self,
        pool: &WorkerPool,
        gamma: &Array2<f64>,
        eta: Option<f64>,
        n_obs: usize,
    ) -> Result<InverseEstimate>;

    /// Whether this is the two-stage adaptive estimator.
    fn is_adaptive(&self) -> bool;
}

/// Assemble column solutions into a matrix: entry `k` of `columns` becomes column `k`.
pub(crate) fn assemble_columns(p: usize, columns: &[Array1<f64>]) -> Array2<f64> {
    let mut d = Array2::zeros((p, p));
    for (k, col) in columns.iter().enumerate() {
        d.column_mut(k).assign(col);
    }
    d
}

/// Symmetrize, then either correct the diagonal or report what would need it.
pub(crate) fn finish_estimate(
    raw: &Array2<f64>,
    gamma: &Array2<f64>,
    config: &InverseConfig,
    label: &str,
) -> Result<(Array2<f64>, Vec<usize>, Vec<DataQualityWarning>)> {
    let sym = symmetrize(raw, config.symmetrize)?;

    if config.correct_diagonal {
        let (fixed, corrected) = correct_diagonal(&sym, gamma.view())?;
        return Ok((fixed, corrected, Vec::new()));
    }

    let bad = repair::non_positive_diagonal(&sym);
    let mut warnings = Vec::new();
    if !bad.is_empty() {
        let warning = DataQualityWarning::NonPositiveDiagonal {
            matrix: label.to_string(),
            indices: bad,
        };
        log::warn!("{}", warning);
        warnings.push(warning);
    }
    Ok((sym, Vec::new(), warnings))
}

/// Normalize a precision-type matrix into partial-correlation form.
///
/// Entry `(i, j)` is `−m_ij / √(m_ii · m_jj)`, so the diagonal is exactly
/// `−1` wherever `m_ii > 0`. Off-diagonal entries in a row or column with a
/// non-positive diagonal are NaN or ±∞. A non-square input is a
/// `DimensionMismatch`.
pub fn partial_correlation(m: &Array2<f64>) -> Result<Array2<f64>> {
    let (p, cols) = m.dim();
    if p != cols {
        return Err(LrpcError::DimensionMismatch(format!(
            "partial correlation needs a square matrix, got {}x{}",
            p, cols
        )));
    }
    let diag = m.diag().to_owned();
    let mut out = Array2::from_shape_fn((p, p), |(i, j)| -m[[i, j]] / (diag[i] * diag[j]).sqrt());
    for i in 0..p {
        if diag[i] > 0.0 {
            out[[i, i]] = -1.0;
        }
    }
    Ok(out)
}
