//! Long-run partial correlations of the idiosyncratic component.
//!
//! Given a fitted factor + VAR model, the innovation precision matrix Delta
//! is estimated from the innovation covariance. The long-run precision then
//! follows from the VAR transfer function at frequency zero,
//!
//! ```text
//! Omega = 2π · A(1)ᵗ · Delta · A(1),    A(1) = I − Σ_l A_l,
//! ```
//!
//! and both matrices are normalized into partial correlations.

pub mod config;

use ndarray::{s, Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::collaborators::{DynamicEstimator, ThresholdOutcome, Thresholder};
use crate::cv::{var_order, CrossValidator, CvInputs, CvResult};
use crate::error::{LrpcError, Result};
use crate::inverse::repair::non_positive_diagonal;
use crate::inverse::{
    correct_diagonal, partial_correlation, AdaptiveInverse, DataQualityWarning, DirectInverse,
    InverseEstimator,
};
use crate::utils::parallel::WorkerPool;

pub use config::LrpcConfig;

/// Quantities of a fitted factor + VAR model consumed by the assembler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorVarFit {
    /// Covariance of the VAR innovations (p×p)
    pub innovation_autocovariance: Array2<f64>,

    /// Stacked VAR coefficients `[A_1, …, A_d]` (p×(d·p))
    pub var_coefficients: Array2<f64>,

    /// Spectral density of the idiosyncratic component at frequency zero (p×p)
    pub spectral_density: Array2<f64>,

    /// Mean of each series (length p)
    pub mean: Array1<f64>,

    /// Number of common factors
    pub factor_count: usize,

    /// Kernel bandwidth of the spectral estimator
    pub kernel_bandwidth: f64,
}

impl FactorVarFit {
    /// Number of variables, after checking that every field agrees on it.
    pub fn dimension(&self) -> Result<usize> {
        let p = self.mean.len();
        for (name, m) in [
            ("innovation autocovariance", &self.innovation_autocovariance),
            ("spectral density", &self.spectral_density),
        ] {
            if m.dim() != (p, p) {
                return Err(LrpcError::DimensionMismatch(format!(
                    "{} is {:?}, expected {}x{}",
                    name,
                    m.dim(),
                    p,
                    p
                )));
            }
        }
        var_order(&self.var_coefficients, p)?;
        Ok(p)
    }
}

/// Diagnostics of one thresholding step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdDiagnostics {
    /// Selected threshold
    pub threshold: f64,

    /// Candidate thresholds
    pub grid: Vec<f64>,

    /// Off-diagonal pairs above each candidate
    pub edge_counts: Vec<usize>,
}

impl From<&ThresholdOutcome> for ThresholdDiagnostics {
    fn from(outcome: &ThresholdOutcome) -> Self {
        Self {
            threshold: outcome.threshold,
            grid: outcome.grid.clone(),
            edge_counts: outcome.edge_counts.clone(),
        }
    }
}

/// Output bundle of [`LongRunPartialCorrelation::estimate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LrpcResult {
    /// Innovation precision estimate
    pub delta: Array2<f64>,

    /// Long-run precision estimate
    pub omega: Array2<f64>,

    /// Partial correlations from Delta
    pub pc: Array2<f64>,

    /// Long-run partial correlations from Omega
    pub lrpc: Array2<f64>,

    /// Regularization value used
    pub eta: f64,

    /// Pilot-stage regularization, when the adaptive estimator ran
    pub eta_adaptive: Option<f64>,

    /// Whether the adaptive estimator was used
    pub adaptive: bool,

    /// Diagonal indices of Delta replaced by the pseudo-inverse fallback
    pub delta_corrected: Vec<usize>,

    /// Diagonal indices of Omega replaced by the pseudo-inverse fallback
    pub omega_corrected: Vec<usize>,

    /// Unrepaired data-quality issues
    pub warnings: Vec<DataQualityWarning>,

    /// Cross-validation diagnostics, when eta was selected by it
    pub cv: Option<CvResult>,

    /// Thresholding diagnostics for Delta
    pub delta_threshold: Option<ThresholdDiagnostics>,

    /// Thresholding diagnostics for Omega
    pub omega_threshold: Option<ThresholdDiagnostics>,
}

/// `A(1) = I − Σ_l A_l` for stacked VAR coefficients `beta` (p×(d·p)).
pub fn var_transform(beta: &Array2<f64>, p: usize) -> Result<Array2<f64>> {
    let d = var_order(beta, p)?;
    let mut a1 = Array2::<f64>::eye(p);
    for l in 0..d {
        a1 = a1 - beta.slice(s![.., l * p..(l + 1) * p]);
    }
    Ok(a1)
}

/// Long-run partial-correlation assembler.
///
/// # Example
///
/// ```
/// use lrpc_rs::collaborators::{EdgeCountThreshold, SampleAutocovariance};
/// use lrpc_rs::lrpc::{FactorVarFit, LongRunPartialCorrelation, LrpcConfig};
/// use ndarray::{Array1, Array2};
///
/// let p = 3;
/// let fit = FactorVarFit {
///     innovation_autocovariance: Array2::eye(p),
///     var_coefficients: Array2::zeros((p, p)),
///     spectral_density: Array2::eye(p) / (2.0 * std::f64::consts::PI),
///     mean: Array1::zeros(p),
///     factor_count: 0,
///     kernel_bandwidth: 4.0,
/// };
/// let x = Array2::<f64>::zeros((p, 50));
///
/// let result = LongRunPartialCorrelation::new(LrpcConfig::default().with_eta(0.1))
///     .estimate(&fit, x.view(), &SampleAutocovariance::new(), &EdgeCountThreshold::new())
///     .unwrap();
/// assert_eq!(result.pc[[0, 0]], -1.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct LongRunPartialCorrelation {
    /// Configuration options
    config: LrpcConfig,
}

impl LongRunPartialCorrelation {
    /// Create an assembler with the given configuration.
    pub fn new(config: LrpcConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    pub fn config(&self) -> &LrpcConfig {
        &self.config
    }

    /// Estimate Delta, Omega and their partial correlations.
    ///
    /// # Arguments
    ///
    /// * `fit` - The fitted factor + VAR model
    /// * `x` - Raw series, p×n (rows are variables)
    /// * `dynamic` - Re-estimator used by cross-validation
    /// * `thresholder` - Used when `do_threshold` is set
    ///
    /// # Returns
    ///
    /// * `Result<LrpcResult>` - The estimates and their diagnostics
    pub fn estimate(
        &self,
        fit: &FactorVarFit,
        x: ArrayView2<'_, f64>,
        dynamic: &dyn DynamicEstimator,
        thresholder: &dyn Thresholder,
    ) -> Result<LrpcResult> {
        let config = &self.config;
        config.validate()?;

        let p = fit.dimension()?;
        let (rows, n) = x.dim();
        if rows != p {
            return Err(LrpcError::DimensionMismatch(format!(
                "Series has {} variables but the fitted model has {}",
                rows, p
            )));
        }
        if n < 2 {
            return Err(LrpcError::InvalidInput(format!(
                "need at least two observations, got {}",
                n
            )));
        }

        let demeaned = &x - &fit.mean.view().insert_axis(Axis(1));
        let gamma = &fit.innovation_autocovariance;
        let a1 = var_transform(&fit.var_coefficients, p)?;

        let pool = match config.n_cores {
            Some(n_cores) => WorkerPool::new(n_cores)?,
            None => WorkerPool::with_default_size()?,
        };

        let estimator: Box<dyn InverseEstimator> = if config.adaptive {
            Box::new(AdaptiveInverse::with_config(
                config.inverse_config(),
                config.adaptive_options(),
            ))
        } else {
            Box::new(DirectInverse::with_config(config.inverse_config()))
        };

        let (eta, cv) = match config.eta {
            Some(eta) => (eta, None),
            None => {
                let inputs = CvInputs {
                    x: demeaned.view(),
                    full_target: gamma,
                    var_coefficients: Some(&fit.var_coefficients),
                    factor_count: fit.factor_count,
                    kernel_bandwidth: fit.kernel_bandwidth,
                };
                let cv = CrossValidator::with_config(config.cv_config()).run(
                    &pool,
                    inputs,
                    estimator.as_ref(),
                    dynamic,
                )?;
                (cv.eta, Some(cv))
            }
        };

        let estimate = estimator.estimate_in(&pool, gamma, Some(eta), n)?;
        let mut warnings = estimate.warnings;

        let (delta, delta_threshold) = if config.do_threshold {
            let outcome = thresholder.threshold(&estimate.matrix)?;
            let diagnostics = ThresholdDiagnostics::from(&outcome);
            (outcome.matrix, Some(diagnostics))
        } else {
            (estimate.matrix, None)
        };

        let omega = a1.t().dot(&delta).dot(&a1) * (2.0 * PI);

        let (omega, omega_corrected) = if config.correct_diagonal {
            correct_diagonal(&omega, fit.spectral_density.view())?
        } else {
            let bad = non_positive_diagonal(&omega);
            if !bad.is_empty() {
                let warning = DataQualityWarning::NonPositiveDiagonal {
                    matrix: "Omega".to_string(),
                    indices: bad,
                };
                log::warn!("{}", warning);
                warnings.push(warning);
            }
            (omega, Vec::new())
        };

        let (omega, omega_threshold) = if config.do_threshold {
            let outcome = thresholder.threshold(&omega)?;
            let diagnostics = ThresholdDiagnostics::from(&outcome);
            (outcome.matrix, Some(diagnostics))
        } else {
            (omega, None)
        };

        let pc = partial_correlation(&delta)?;
        let lrpc = partial_correlation(&omega)?;

        log::debug!(
            "long-run partial correlations estimated with eta = {:.4e} ({} estimator)",
            eta,
            if config.adaptive { "adaptive" } else { "direct" }
        );

        Ok(LrpcResult {
            delta,
            omega,
            pc,
            lrpc,
            eta,
            eta_adaptive: estimate.eta_adaptive,
            adaptive: config.adaptive,
            delta_corrected: estimate.corrected,
            omega_corrected,
            warnings,
            cv,
            delta_threshold,
            omega_threshold,
        })
    }
}
