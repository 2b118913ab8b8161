//! Sample autocovariances and a kernel long-run covariance.
//!
//! The long-run estimate has the form
//!
//! ```text
//! f(0) = (1/2π) · [ Γ(0) + Σ_{l=1}^{L} w_l (Γ(l) + Γ(l)ᵗ) ],
//! Γ(l) = (1/n) Σ_{t=l}^{n−1} x_t x_{t−l}ᵗ,
//! ```
//!
//! with kernel weights `w_l` evaluated at `l / (L + 1)` and `L` the truncated
//! kernel bandwidth.

use ndarray::{s, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use super::{DynamicEstimate, DynamicEstimator};
use crate::error::{LrpcError, Result};

/// Lag-window taper family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum KernelType {
    /// Only lag zero contributes
    IID,
    /// Triangular (Newey–West) kernel
    Bartlett,
    /// Parzen kernel, heavier down-weighting at high lags
    Parzen,
}

impl KernelType {
    /// Kernel weight at taper argument `x`, typically `l / (L + 1)`.
    pub fn weight(&self, x: f64) -> f64 {
        let a = x.abs();
        match self {
            KernelType::IID => {
                if x == 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            KernelType::Bartlett => {
                if a <= 1.0 {
                    1.0 - a
                } else {
                    0.0
                }
            }
            KernelType::Parzen => {
                if a <= 0.5 {
                    1.0 - 6.0 * a * a + 6.0 * a * a * a
                } else if a <= 1.0 {
                    2.0 * (1.0 - a).powi(3)
                } else {
                    0.0
                }
            }
        }
    }
}

/// Reference [`DynamicEstimator`] for series without a common component.
///
/// The factor count is ignored: the whole series is treated as
/// idiosyncratic. Rows are centered by their own sample mean unless
/// `center` is off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleAutocovariance {
    /// Kernel used for the long-run covariance. Default: Bartlett
    pub kernel: KernelType,

    /// Subtract each row's sample mean first. Default: true
    pub center: bool,
}

impl Default for SampleAutocovariance {
    fn default() -> Self {
        Self {
            kernel: KernelType::Bartlett,
            center: true,
        }
    }
}

impl SampleAutocovariance {
    /// Create an estimator with the Bartlett kernel and centering.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the kernel.
    pub fn with_kernel(mut self, kernel: KernelType) -> Self {
        self.kernel = kernel;
        self
    }

    /// Set whether rows are centered.
    pub fn with_center(mut self, center: bool) -> Self {
        self.center = center;
        self
    }

    /// Sample autocovariance `Γ(lag)` of an already centered series.
    pub fn autocovariance(x: ArrayView2<'_, f64>, lag: usize) -> Array2<f64> {
        let n = x.ncols();
        let lead = x.slice(s![.., lag..]);
        let lagged = x.slice(s![.., ..n - lag]);
        lead.dot(&lagged.t()) / n as f64
    }
}

impl DynamicEstimator for SampleAutocovariance {
    fn estimate(
        &self,
        x: ArrayView2<'_, f64>,
        _factor_count: usize,
        kernel_bandwidth: f64,
        max_lag: usize,
    ) -> Result<DynamicEstimate> {
        let (p, n) = x.dim();
        if p == 0 || n < 2 {
            return Err(LrpcError::InvalidInput(format!(
                "need at least one variable and two observations, got {}x{}",
                p, n
            )));
        }
        if max_lag >= n {
            return Err(LrpcError::InvalidInput(format!(
                "max lag {} must be below the series length {}",
                max_lag, n
            )));
        }
        if !kernel_bandwidth.is_finite() || kernel_bandwidth < 0.0 {
            return Err(LrpcError::InvalidInput(format!(
                "kernel bandwidth must be finite and non-negative, got {}",
                kernel_bandwidth
            )));
        }

        let centered = if self.center {
            let mean = x.mean_axis(Axis(1)).ok_or_else(|| {
                LrpcError::InvalidInput("cannot center an empty series".to_string())
            })?;
            &x - &mean.insert_axis(Axis(1))
        } else {
            x.to_owned()
        };

        // Bandwidth truncated to the available lags
        let bandwidth = (kernel_bandwidth.floor() as usize).min(n - 1);
        let needed = bandwidth.max(max_lag);

        let lags: Vec<Array2<f64>> = (0..=needed)
            .map(|l| Self::autocovariance(centered.view(), l))
            .collect();

        let mut long_run = lags[0].clone();
        for l in 1..=bandwidth {
            let w = self.kernel.weight(l as f64 / (bandwidth as f64 + 1.0));
            if w != 0.0 {
                long_run = long_run + (&lags[l] + &lags[l].t()) * w;
            }
        }

        Ok(DynamicEstimate {
            spectral_density: long_run / (2.0 * PI),
            autocovariances: lags.into_iter().take(max_lag + 1).collect(),
        })
    }
}
