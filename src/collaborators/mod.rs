//! External collaborators of the estimation core.
//!
//! The cross-validator re-estimates spectral and autocovariance matrices on
//! held-out data through a [`DynamicEstimator`], and the assembler may
//! threshold its outputs through a [`Thresholder`]. Factor-model fitting
//! lives outside this crate; the implementations provided here are
//! reference versions for factor-free data and for tests.

pub mod autocov;
pub mod threshold;

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use autocov::{KernelType, SampleAutocovariance};
pub use threshold::EdgeCountThreshold;

/// Spectral and autocovariance estimates of the idiosyncratic component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DynamicEstimate {
    /// Spectral density at frequency zero (p×p, real part)
    pub spectral_density: Array2<f64>,

    /// Autocovariances `Γ(l) = E[x_t x_{t−l}ᵗ]` for `l = 0..=max_lag`
    pub autocovariances: Vec<Array2<f64>>,
}

/// Re-estimates the idiosyncratic second-order structure of a sub-series.
pub trait DynamicEstimator: Sync {
    /// Estimate on `x` (p×n, rows are variables).
    ///
    /// # Arguments
    ///
    /// * `x` - The sub-series
    /// * `factor_count` - Number of common factors to remove
    /// * `kernel_bandwidth` - Kernel bandwidth of the spectral smoother
    /// * `max_lag` - Largest autocovariance lag to return
    fn estimate(
        &self,
        x: ArrayView2<'_, f64>,
        factor_count: usize,
        kernel_bandwidth: f64,
        max_lag: usize,
    ) -> Result<DynamicEstimate>;
}

/// A thresholded matrix with the data behind the threshold choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdOutcome {
    /// The thresholded matrix
    pub matrix: Array2<f64>,

    /// Selected threshold
    pub threshold: f64,

    /// Candidate thresholds, decreasing
    pub grid: Vec<f64>,

    /// Number of off-diagonal pairs above each candidate
    pub edge_counts: Vec<usize>,
}

/// Sets small entries of a matrix to zero.
pub trait Thresholder: Sync {
    /// Threshold `m`.
    fn threshold(&self, m: &Array2<f64>) -> Result<ThresholdOutcome>;
}
