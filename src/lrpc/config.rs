//! Configuration options for the long-run partial-correlation assembler.

use serde::{Deserialize, Serialize};

use crate::cv::{CvConfig, CvTarget};
use crate::error::{LrpcError, Result};
use crate::inverse::config::{validate_eta, AdaptiveOptions, InverseConfig};
use crate::inverse::Symmetrize;

/// Configuration options for [`super::LongRunPartialCorrelation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LrpcConfig {
    /// Regularization value; `None` selects it by cross-validation. Default: None
    pub eta: Option<f64>,

    /// Use the two-stage adaptive estimator. Default: false
    pub adaptive: bool,

    /// Pilot-stage regularization of the adaptive estimator; `None` uses
    /// `2·√(log p / n)`. Default: None
    pub eta_adaptive: Option<f64>,

    /// Replace non-positive diagonal entries of Delta and Omega. Default: true
    pub correct_diagonal: bool,

    /// Threshold Delta and Omega after estimation. Default: false
    pub do_threshold: bool,

    /// Number of cross-validation folds. Default: 1
    pub n_folds: usize,

    /// Number of candidate values on the cross-validation path. Default: 10
    pub path_length: usize,

    /// Worker pool size; `None` uses `min(cores − 1, 3)`. Default: None
    pub n_cores: Option<usize>,

    /// Symmetrization rule for the assembled columns. Default: Min
    pub symmetrize: Symmetrize,
}

impl Default for LrpcConfig {
    fn default() -> Self {
        Self {
            eta: None,
            adaptive: false,
            eta_adaptive: None,
            correct_diagonal: true,
            do_threshold: false,
            n_folds: 1,
            path_length: 10,
            n_cores: None,
            symmetrize: Symmetrize::default(),
        }
    }
}

impl LrpcConfig {
    /// Fix the regularization value and skip cross-validation.
    pub fn with_eta(mut self, eta: f64) -> Self {
        self.eta = Some(eta);
        self
    }

    /// Set whether the adaptive estimator is used.
    pub fn with_adaptive(mut self, adaptive: bool) -> Self {
        self.adaptive = adaptive;
        self
    }

    /// Set the pilot-stage regularization.
    pub fn with_eta_adaptive(mut self, eta_adaptive: f64) -> Self {
        self.eta_adaptive = Some(eta_adaptive);
        self
    }

    /// Set whether diagonals are corrected.
    pub fn with_correct_diagonal(mut self, correct: bool) -> Self {
        self.correct_diagonal = correct;
        self
    }

    /// Set whether Delta and Omega are thresholded.
    pub fn with_threshold(mut self, do_threshold: bool) -> Self {
        self.do_threshold = do_threshold;
        self
    }

    /// Set the number of cross-validation folds.
    pub fn with_n_folds(mut self, n_folds: usize) -> Self {
        self.n_folds = n_folds;
        self
    }

    /// Set the cross-validation path length.
    pub fn with_path_length(mut self, path_length: usize) -> Self {
        self.path_length = path_length;
        self
    }

    /// Set the worker pool size.
    pub fn with_n_cores(mut self, n_cores: usize) -> Self {
        self.n_cores = Some(n_cores);
        self
    }

    /// Set the symmetrization rule.
    pub fn with_symmetrize(mut self, rule: Symmetrize) -> Self {
        self.symmetrize = rule;
        self
    }

    /// Reject configurations that cannot run.
    pub fn validate(&self) -> Result<()> {
        self.cv_config().validate()?;
        if let Some(eta) = self.eta {
            validate_eta("eta", eta)?;
        }
        if let Some(eta_adaptive) = self.eta_adaptive {
            validate_eta("eta_adaptive", eta_adaptive)?;
        }
        if self.n_cores == Some(0) {
            return Err(LrpcError::InvalidConfig(
                "number of cores must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Options for the inverse estimators.
    pub fn inverse_config(&self) -> InverseConfig {
        InverseConfig::default()
            .with_symmetrize(self.symmetrize)
            .with_correct_diagonal(self.correct_diagonal)
    }

    /// Pilot-stage options for the adaptive estimator.
    pub fn adaptive_options(&self) -> AdaptiveOptions {
        AdaptiveOptions {
            eta_adaptive: self.eta_adaptive,
            relax_cutoff: false,
        }
    }

    /// Cross-validation options; the assembler always scores against the
    /// innovation covariance.
    pub fn cv_config(&self) -> CvConfig {
        CvConfig {
            n_folds: self.n_folds,
            path_length: self.path_length,
            target: CvTarget::AutocovarianceResidual,
        }
    }

    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
