//! Configuration options for cross-validation.

use serde::{Deserialize, Serialize};

use crate::error::{LrpcError, Result};

/// Matrix the held-out data is scored against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CvTarget {
    /// Zero-frequency spectral density of the idiosyncratic component
    Spectral,

    /// Autocovariance minus the VAR-predicted part, i.e. the innovation covariance
    AutocovarianceResidual,
}

impl Default for CvTarget {
    fn default() -> Self {
        CvTarget::AutocovarianceResidual
    }
}

/// Configuration options for the cross-validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CvConfig {
    /// Number of contiguous folds. Default: 1
    pub n_folds: usize,

    /// Number of candidate values on the path. Default: 10
    pub path_length: usize,

    /// Validation target. Default: AutocovarianceResidual
    pub target: CvTarget,
}

impl Default for CvConfig {
    fn default() -> Self {
        Self {
            n_folds: 1,
            path_length: 10,
            target: CvTarget::default(),
        }
    }
}

impl CvConfig {
    /// Reject configurations that cannot run.
    pub fn validate(&self) -> Result<()> {
        if self.n_folds == 0 {
            return Err(LrpcError::InvalidConfig(
                "number of folds must be positive".to_string(),
            ));
        }
        if self.path_length == 0 {
            return Err(LrpcError::InvalidConfig(
                "path length must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
