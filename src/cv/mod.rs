//! Cross-validated choice of the regularization value.
//!
//! A log-spaced path of candidates runs from the largest absolute entry of
//! the target down to one percent of it. The series is cut into contiguous
//! folds; within each fold the first half trains and the second half
//! validates, keeping time order. Each candidate is scored by the Gaussian
//! likelihood (Stein) loss
//!
//! ```text
//! L(D, Γ_test) = tr(D Γ_test) − log det(D Γ_test) − p,
//! ```
//!
//! summed over folds, and the first minimizer along the path is selected.

pub mod config;
pub mod loss;
pub mod path;

use ndarray::{s, Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::collaborators::{DynamicEstimate, DynamicEstimator};
use crate::error::{LrpcError, Result};
use crate::inverse::config::default_adaptive_eta;
use crate::inverse::InverseEstimator;
use crate::utils::parallel::WorkerPool;

pub use config::{CvConfig, CvTarget};
pub use loss::{first_minimum, stein_loss, CV_PENALTY_LOSS};
pub use path::{fold_splits, log_path};

/// Outcome of a cross-validation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvResult {
    /// Selected regularization value
    pub eta: f64,

    /// Index of the selected value in `path`
    pub selected: usize,

    /// Candidate values, decreasing
    pub path: Vec<f64>,

    /// Loss per candidate, summed over folds
    pub losses: Vec<f64>,

    /// Loss per fold and candidate (`fold_losses[fold][candidate]`)
    pub fold_losses: Vec<Vec<f64>>,
}

impl CvResult {
    /// Whether the selected value lies strictly inside the path.
    pub fn is_interior(&self) -> bool {
        self.selected > 0 && self.selected + 1 < self.path.len()
    }

    /// `(eta, loss)` pairs for plotting the loss curve.
    pub fn curve(&self) -> Vec<(f64, f64)> {
        self.path.iter().copied().zip(self.losses.iter().copied()).collect()
    }
}

/// Inputs of a cross-validation run that come from the fitted model.
#[derive(Debug, Clone, Copy)]
pub struct CvInputs<'a> {
    /// Demeaned series, p×n
    pub x: ArrayView2<'a, f64>,

    /// Target matrix on the full sample; sets the top of the path
    pub full_target: &'a Array2<f64>,

    /// Stacked VAR coefficients p×(d·p); required for the residual target
    pub var_coefficients: Option<&'a Array2<f64>>,

    /// Number of common factors
    pub factor_count: usize,

    /// Kernel bandwidth handed to the re-estimator
    pub kernel_bandwidth: f64,
}

/// Regularization-path cross-validator.
#[derive(Debug, Clone, Default)]
pub struct CrossValidator {
    /// Configuration options
    config: CvConfig,
}

impl CrossValidator {
    /// Create a cross-validator with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cross-validator with the given configuration.
    pub fn with_config(config: CvConfig) -> Self {
        Self { config }
    }

    /// Set the number of folds.
    pub fn with_n_folds(mut self, n_folds: usize) -> Self {
        self.config.n_folds = n_folds;
        self
    }

    /// Set the number of candidate values.
    pub fn with_path_length(mut self, path_length: usize) -> Self {
        self.config.path_length = path_length;
        self
    }

    /// Set the validation target.
    pub fn with_target(mut self, target: CvTarget) -> Self {
        self.config.target = target;
        self
    }

    /// The configuration in use.
    pub fn config(&self) -> &CvConfig {
        &self.config
    }

    /// Candidate path for a target of dimension `p` from `n` observations.
    pub fn candidate_path(&self, full_target: &Array2<f64>, n: usize, adaptive: bool) -> Result<Vec<f64>> {
        let p = full_target.nrows();
        let mut top = full_target
            .iter()
            .filter(|v| v.is_finite())
            .fold(0.0_f64, |acc, v| acc.max(v.abs()));
        if adaptive {
            top = top.min(default_adaptive_eta(p, n));
        }
        log_path(top, self.config.path_length)
    }

    /// Run cross-validation.
    ///
    /// # Arguments
    ///
    /// * `pool` - Worker pool shared by every estimator call of the run
    /// * `inputs` - Series, full-sample target and model quantities
    /// * `estimator` - Direct or adaptive inverse estimator
    /// * `dynamic` - Re-estimator for the training and validation halves
    ///
    /// # Returns
    ///
    /// * `Result<CvResult>` - The selected value and the loss curve
    pub fn run(
        &self,
        pool: &WorkerPool,
        inputs: CvInputs<'_>,
        estimator: &dyn InverseEstimator,
        dynamic: &dyn DynamicEstimator,
    ) -> Result<CvResult> {
        self.config.validate()?;
        let (p, n) = inputs.x.dim();
        if inputs.full_target.dim() != (p, p) {
            return Err(LrpcError::DimensionMismatch(format!(
                "Target is {:?} but the series has {} variables",
                inputs.full_target.dim(),
                p
            )));
        }

        let max_lag = match self.config.target {
            CvTarget::Spectral => 0,
            CvTarget::AutocovarianceResidual => {
                let beta = inputs.var_coefficients.ok_or_else(|| {
                    LrpcError::InvalidInput(
                        "the residual target needs VAR coefficients".to_string(),
                    )
                })?;
                var_order(beta, p)?
            }
        };

        let folds = fold_splits(n, self.config.n_folds, max_lag + 2)?;
        let path = self.candidate_path(inputs.full_target, n, estimator.is_adaptive())?;
        let mut fold_losses = Vec::with_capacity(folds.len());

        for (fold, (train, test)) in folds.iter().enumerate() {
            let n_train = train.len();
            let train_target = self.fold_target(&inputs, dynamic, train.clone(), max_lag)?;
            let test_target = self.fold_target(&inputs, dynamic, test.clone(), max_lag)?;

            let losses = path
                .iter()
                .map(|&eta| {
                    match estimator.estimate_in(pool, &train_target, Some(eta), n_train) {
                        Ok(est) => Ok(stein_loss(&est.matrix, &test_target)),
                        Err(err @ LrpcError::ColumnSolveFailed { .. })
                        | Err(err @ LrpcError::LinearAlgebraError(_)) => {
                            log::debug!(
                                "fold {}: eta = {:.4e} scored with penalty ({})",
                                fold,
                                eta,
                                err
                            );
                            Ok(CV_PENALTY_LOSS)
                        }
                        Err(err) => Err(err),
                    }
                })
                .collect::<Result<Vec<f64>>>()?;

            log::debug!("fold {}: losses {:?}", fold, losses);
            fold_losses.push(losses);
        }

        let losses: Vec<f64> = (0..path.len())
            .map(|k| fold_losses.iter().map(|fl| fl[k]).sum())
            .collect();

        let selected = first_minimum(&losses);

        log::debug!(
            "cross-validation selected eta = {:.4e} (index {} of {})",
            path[selected],
            selected,
            path.len()
        );

        Ok(CvResult {
            eta: path[selected],
            selected,
            path,
            losses,
            fold_losses,
        })
    }

    /// Validation target on the time indices `range`.
    fn fold_target(
        &self,
        inputs: &CvInputs<'_>,
        dynamic: &dyn DynamicEstimator,
        range: Range<usize>,
        max_lag: usize,
    ) -> Result<Array2<f64>> {
        let sub = inputs.x.slice(s![.., range]);
        let est = dynamic.estimate(sub, inputs.factor_count, inputs.kernel_bandwidth, max_lag)?;
        match self.config.target {
            CvTarget::Spectral => Ok(est.spectral_density),
            CvTarget::AutocovarianceResidual => {
                let beta = inputs.var_coefficients.ok_or_else(|| {
                    LrpcError::InvalidInput(
                        "the residual target needs VAR coefficients".to_string(),
                    )
                })?;
                residual_autocovariance(&est, beta)
            }
        }
    }
}

/// VAR order `d` of stacked coefficients `beta` (p×(d·p)).
pub fn var_order(beta: &Array2<f64>, p: usize) -> Result<usize> {
    if p == 0 || beta.nrows() != p || beta.ncols() % p != 0 {
        return Err(LrpcError::DimensionMismatch(format!(
            "VAR coefficients must be {}x(d*{}), got {:?}",
            p,
            p,
            beta.dim()
        )));
    }
    Ok(beta.ncols() / p)
}

/// Innovation covariance implied by autocovariances and VAR coefficients:
/// `Γ(0) − Σ_{l=1}^{d} A_l Γ(l)ᵗ`.
pub fn residual_autocovariance(est: &DynamicEstimate, beta: &Array2<f64>) -> Result<Array2<f64>> {
    let first = est.autocovariances.first().ok_or_else(|| {
        LrpcError::Collaborator("re-estimator returned no autocovariances".to_string())
    })?;
    let p = first.nrows();
    let d = var_order(beta, p)?;
    if est.autocovariances.len() < d + 1 {
        return Err(LrpcError::Collaborator(format!(
            "need autocovariances up to lag {}, got {}",
            d,
            est.autocovariances.len().saturating_sub(1)
        )));
    }

    let mut out = first.clone();
    for l in 1..=d {
        let a_l = beta.slice(s![.., (l - 1) * p..l * p]);
        out = out - a_l.dot(&est.autocovariances[l].t());
    }
    Ok(out)
}
