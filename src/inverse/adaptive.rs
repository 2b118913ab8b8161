//! Two-stage adaptive inverse estimator.
//!
//! Stage 1 estimates the diagonal of the inverse on a ridge-perturbed target
//! for the coordinates whose variance is below `√(n / log p)`; the others keep
//! the fallback `√(log p / n)`. The pilot column `i` satisfies
//! `|(Γ₁ d)_j − δ_ij| ≤ η_a · max(Γ₁_ii, Γ₁_jj) · d_i` with `d_i ≥ 0`, so the
//! zero vector is never feasible. Stage 2 solves every column with row
//! tolerances `η · √(Γ₁_jj) · √(pilot_i)`.

use ndarray::{Array1, Array2};

use super::column::{ensure_nonzero, ColumnProblem};
use super::config::{default_adaptive_eta, validate_eta, AdaptiveOptions, InverseConfig};
use super::repair::Symmetrize;
use super::{assemble_columns, finish_estimate, InverseEstimate, InverseEstimator};
use crate::error::{LrpcError, Result};
use crate::utils::parallel::WorkerPool;

/// Adaptive (Cai–Liu–Zhou) inverse estimator.
#[derive(Debug, Clone, Default)]
pub struct AdaptiveInverse {
    /// Shared estimator options
    config: InverseConfig,

    /// Pilot-stage options
    options: AdaptiveOptions,

    /// Worker pool size for standalone calls; `None` uses the default size
    n_cores: Option<usize>,
}

impl AdaptiveInverse {
    /// Create an adaptive estimator with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an adaptive estimator from shared and pilot-stage options.
    pub fn with_config(config: InverseConfig, options: AdaptiveOptions) -> Self {
        Self {
            config,
            options,
            n_cores: None,
        }
    }

    /// Set the pilot-stage regularization.
    pub fn with_eta_adaptive(mut self, eta_adaptive: f64) -> Self {
        self.options.eta_adaptive = Some(eta_adaptive);
        self
    }

    /// Solve the pilot stage for every index.
    pub fn with_relax_cutoff(mut self, relax: bool) -> Self {
        self.options.relax_cutoff = relax;
        self
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

    /// Set the worker pool size used by [`AdaptiveInverse::estimate`].
    pub fn with_n_cores(mut self, n_cores: usize) -> Self {
        self.n_cores = Some(n_cores);
        self
    }

    /// Estimate the inverse of `gamma` on a pool created for this call.
    ///
    /// # Arguments
    ///
    /// * `gamma` - Square target matrix with non-negative diagonal
    /// * `n_obs` - Number of observations behind `gamma`
    /// * `eta` - Final-stage regularization; `None` uses `2·√(log p / n)`
    pub fn estimate(
        &self,
        gamma: &Array2<f64>,
        n_obs: usize,
        eta: Option<f64>,
    ) -> Result<InverseEstimate> {
        let pool = match self.n_cores {
            Some(n) => WorkerPool::new(n)?,
            None => WorkerPool::with_default_size()?,
        };
        self.estimate_with_pool(&pool, gamma, n_obs, eta)
    }

    /// Estimate the inverse of `gamma` on an existing pool. Both stages share it.
    pub fn estimate_with_pool(
        &self,
        pool: &WorkerPool,
        gamma: &Array2<f64>,
        n_obs: usize,
        eta: Option<f64>,
    ) -> Result<InverseEstimate> {
        let (p, cols) = gamma.dim();
        if p != cols {
            return Err(LrpcError::DimensionMismatch(format!(
                "Target matrix must be square, got {}x{}",
                p, cols
            )));
        }
        if p < 2 {
            return Err(LrpcError::InvalidInput(
                "the adaptive estimator needs at least two variables".to_string(),
            ));
        }
        if n_obs < 2 {
            return Err(LrpcError::InvalidInput(format!(
                "the adaptive estimator needs at least two observations, got {}",
                n_obs
            )));
        }

        let eta_adaptive = self
            .options
            .eta_adaptive
            .unwrap_or_else(|| default_adaptive_eta(p, n_obs));
        validate_eta("eta_adaptive", eta_adaptive)?;
        let eta = eta.unwrap_or_else(|| default_adaptive_eta(p, n_obs));
        validate_eta("eta", eta)?;

        let n = n_obs as f64;
        let log_p = (p as f64).ln();

        let mut ridged = gamma.clone();
        for i in 0..p {
            ridged[[i, i]] += 1.0 / n;
        }
        let ridged_diag = ridged.diag().to_owned();
        if let Some(bad) = ridged_diag.iter().find(|v| !(**v >= 0.0)) {
            return Err(LrpcError::InvalidInput(format!(
                "target diagonal must be non-negative, got {}",
                bad
            )));
        }

        let pilot = self.pilot_diagonal(pool, gamma, &ridged, eta_adaptive, n, log_p)?;

        // Stage 2
        let sqrt_diag = ridged_diag.mapv(f64::sqrt);
        let columns = pool.map_indexed(p, |i| {
            let scale = eta * pilot[i].max(0.0).sqrt();
            let tolerances = &sqrt_diag * scale;
            let d = ColumnProblem::new(ridged.view(), i, tolerances.view())?.solve()?;
            ensure_nonzero(i, &d)?;
            Ok(d)
        })?;

        let raw = assemble_columns(p, &columns);
        let (matrix, corrected, warnings) = finish_estimate(&raw, gamma, &self.config, "Delta")?;

        log::debug!(
            "adaptive inverse: p = {}, n = {}, eta = {:.4e}, eta_adaptive = {:.4e}, corrected = {}",
            p,
            n_obs,
            eta,
            eta_adaptive,
            corrected.len()
        );

        Ok(InverseEstimate {
            matrix,
            eta,
            symmetrize: self.config.symmetrize,
            corrected,
            warnings,
            pilot: Some(pilot),
            eta_adaptive: Some(eta_adaptive),
        })
    }

    /// Stage 1: pilot estimates of the inverse diagonal.
    fn pilot_diagonal(
        &self,
        pool: &WorkerPool,
        gamma: &Array2<f64>,
        ridged: &Array2<f64>,
        eta_adaptive: f64,
        n: f64,
        log_p: f64,
    ) -> Result<Array1<f64>> {
        let p = gamma.nrows();
        let cutoff = (n / log_p).sqrt();
        let fallback = (log_p / n).sqrt();

        let eligible: Vec<usize> = (0..p)
            .filter(|&i| self.options.relax_cutoff || gamma[[i, i]] < cutoff)
            .collect();
        if eligible.len() < p {
            log::debug!(
                "pilot stage skips {} of {} coordinates above the cutoff {:.4e}",
                p - eligible.len(),
                p,
                cutoff
            );
        }

        let abs_diag = ridged.diag().mapv(f64::abs);
        let solved = pool.map_subset(&eligible, |i| {
            let tolerances = abs_diag.mapv(|g| eta_adaptive * g.max(abs_diag[i]));
            let d = ColumnProblem::new(ridged.view(), i, tolerances.view())?
                .with_scaled_tolerance(true)
                .solve()?;
            Ok(d[i])
        })?;

        let mut pilot = Array1::from_elem(p, fallback);
        for (i, value) in solved {
            pilot[i] = value.max(0.0);
        }
        Ok(pilot)
    }
}

impl InverseEstimator for AdaptiveInverse {
    fn estimate_in(
        &self,
        pool: &WorkerPool,
        gamma: &Array2<f64>,
        eta: Option<f64>,
        n_obs: usize,
    ) -> Result<InverseEstimate> {
        self.estimate_with_pool(pool, gamma, n_obs, eta)
    }

    fn is_adaptive(&self) -> bool {
        true
    }
}
