//! Configuration options for the inverse estimators.

use serde::{Deserialize, Serialize};

use super::repair::Symmetrize;
use crate::error::{LrpcError, Result};

/// Options shared by the direct and adaptive inverse estimators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InverseConfig {
    /// How the assembled matrix is combined with its transpose. Default: Min
    pub symmetrize: Symmetrize,

    /// Replace non-positive diagonal entries using the pseudo-inverse of the
    /// target. Default: true
    pub correct_diagonal: bool,
}

impl Default for InverseConfig {
    fn default() -> Self {
        Self {
            symmetrize: Symmetrize::default(),
            correct_diagonal: true,
        }
    }
}

impl InverseConfig {
    /// Set the symmetrization rule.
    pub fn with_symmetrize(mut self, rule: Symmetrize) -> Self {
        self.symmetrize = rule;
        self
    }

    /// Set whether the diagonal is corrected after assembly.
    pub fn with_correct_diagonal(mut self, correct: bool) -> Self {
        self.correct_diagonal = correct;
        self
    }
}

/// Options specific to the two-stage adaptive estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveOptions {
    /// Regularization of the pilot stage. Default: 2·√(log p / n)
    pub eta_adaptive: Option<f64>,

    /// Solve the pilot stage for every index instead of only those with
    /// diagonal below √(n / log p). Default: false
    pub relax_cutoff: bool,
}

impl Default for AdaptiveOptions {
    fn default() -> Self {
        Self {
            eta_adaptive: None,
            relax_cutoff: false,
        }
    }
}

impl AdaptiveOptions {
    /// Set the pilot-stage regularization.
    pub fn with_eta_adaptive(mut self, eta_adaptive: f64) -> Self {
        self.eta_adaptive = Some(eta_adaptive);
        self
    }

    /// Set whether the pilot cutoff is relaxed.
    pub fn with_relax_cutoff(mut self, relax: bool) -> Self {
        self.relax_cutoff = relax;
        self
    }
}

/// Check a regularization value.
pub fn validate_eta(name: &str, eta: f64) -> Result<()> {
    if !eta.is_finite() || eta <= 0.0 {
        return Err(LrpcError::InvalidConfig(format!(
            "{} must be positive and finite, got {}",
            name, eta
        )));
    }
    Ok(())
}

/// Default regularization `2·√(log p / n)` used by the adaptive estimator.
pub fn default_adaptive_eta(p: usize, n: usize) -> f64 {
    2.0 * ((p as f64).ln() / n as f64).sqrt()
}
