//! Direct inverse estimator with a uniform tolerance.

use ndarray::{Array1, Array2};

use super::column::{ensure_nonzero, ColumnProblem};
use super::config::{validate_eta, InverseConfig};
use super::repair::Symmetrize;
use super::{assemble_columns, finish_estimate, InverseEstimate, InverseEstimator};
use crate::error::{LrpcError, Result};
use crate::utils::parallel::WorkerPool;

/// Sparse inverse estimate for a fixed regularization value.
///
/// Column `i` minimizes `‖d‖₁` subject to `‖Γ d − e_i‖∞ ≤ η`. The columns
/// are solved independently on the worker pool and assembled by index.
///
/// # Example
///
/// ```
/// use lrpc_rs::inverse::DirectInverse;
/// use ndarray::Array2;
///
/// let gamma = Array2::<f64>::eye(4) * 2.0;
/// let estimate = DirectInverse::new().estimate(&gamma, 0.01).unwrap();
/// assert!((estimate.matrix[[0, 0]] - 0.495).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DirectInverse {
    /// Configuration options
    config: InverseConfig,

    /// Worker pool size for standalone calls; `None` uses the default size
    n_cores: Option<usize>,
}

impl DirectInverse {
    /// Create a direct estimator with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a direct estimator with the given configuration.
    pub fn with_config(config: InverseConfig) -> Self {
        Self {
            config,
            n_cores: None,
        }
    }

    /// Set the symmetrization rule.
    pub fn with_symmetrize(mut self, rule: Symmetrize) -> Self {
        self.config.symmetrize = rule;
        self
    }

    /// Set whether the diagonal is corrected after assembly.
    pub fn with_correct_diagonal(mut self, correct: bool) -> Self {
        self.config.correct_diagonal = correct;
        self
    }

    /// Set the worker pool size used by [`DirectInverse::estimate`].
    pub fn with_n_cores(mut self, n_cores: usize) -> Self {
        self.n_cores = Some(n_cores);
        self
    }

    /// The configuration in use.
    pub fn config(&self) -> &InverseConfig {
        &self.config
    }

    /// Estimate the inverse of `gamma` on a pool created for this call.
    ///
    /// # Arguments
    ///
    /// * `gamma` - Square target matrix
    /// * `eta` - Positive regularization value
    ///
    /// # Returns
    ///
    /// * `Result<InverseEstimate>` - The estimate, or the first column failure
    pub fn estimate(&self, gamma: &Array2<f64>, eta: f64) -> Result<InverseEstimate> {
        validate_eta("eta", eta)?;
        let pool = match self.n_cores {
            Some(n) => WorkerPool::new(n)?,
            None => WorkerPool::with_default_size()?,
        };
        self.estimate_with_pool(&pool, gamma, eta)
    }

    /// Estimate the inverse of `gamma` on an existing pool.
    pub fn estimate_with_pool(
        &self,
        pool: &WorkerPool,
        gamma: &Array2<f64>,
        eta: f64,
    ) -> Result<InverseEstimate> {
        validate_eta("eta", eta)?;
        let (p, cols) = gamma.dim();
        if p != cols {
            return Err(LrpcError::DimensionMismatch(format!(
                "Target matrix must be square, got {}x{}",
                p, cols
            )));
        }

        let tolerances = Array1::from_elem(p, eta);
        let columns = pool.map_indexed(p, |i| {
            let d = ColumnProblem::new(gamma.view(), i, tolerances.view())?.solve()?;
            ensure_nonzero(i, &d)?;
            Ok(d)
        })?;

        let raw = assemble_columns(p, &columns);
        let (matrix, corrected, warnings) = finish_estimate(&raw, gamma, &self.config, "Delta")?;

        log::debug!(
            "direct inverse: p = {}, eta = {:.4e}, corrected diagonal entries = {}",
            p,
            eta,
            corrected.len()
        );

        Ok(InverseEstimate {
            matrix,
            eta,
            symmetrize: self.config.symmetrize,
            corrected,
            warnings,
            pilot: None,
            eta_adaptive: None,
        })
    }
}

impl InverseEstimator for DirectInverse {
    fn estimate_in(
        &self,
        pool: &WorkerPool,
        gamma: &Array2<f64>,
        eta: Option<f64>,
        _n_obs: usize,
    ) -> Result<InverseEstimate> {
        let eta = eta.ok_or_else(|| {
            LrpcError::InvalidConfig("the direct estimator requires a value for eta".to_string())
        })?;
        self.estimate_with_pool(pool, gamma, eta)
    }

    fn is_adaptive(&self) -> bool {
        false
    }
}
