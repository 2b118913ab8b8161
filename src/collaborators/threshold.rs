//! Data-driven hard thresholding of off-diagonal entries.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::{ThresholdOutcome, Thresholder};
use crate::error::{LrpcError, Result};

/// Chooses a hard threshold at the elbow of the edge-count curve.
///
/// Candidates are log-spaced between the largest and the smallest non-zero
/// off-diagonal magnitude. For each candidate the number of upper-triangular
/// entries above it is counted; the selected threshold is the candidate whose
/// count lies furthest from the chord joining the first and last counts.
/// Off-diagonal entries below the threshold are set to zero; the diagonal is
/// kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeCountThreshold {
    /// Number of candidate thresholds. Default: 500
    pub path_length: usize,
}

impl Default for EdgeCountThreshold {
    fn default() -> Self {
        Self { path_length: 500 }
    }
}

impl EdgeCountThreshold {
    /// Create a thresholder with the default grid size.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of candidate thresholds.
    pub fn with_path_length(mut self, path_length: usize) -> Self {
        self.path_length = path_length;
        self
    }

    fn apply(m: &Array2<f64>, threshold: f64) -> Array2<f64> {
        let mut out = m.clone();
        for ((i, j), v) in out.indexed_iter_mut() {
            if i != j && v.abs() < threshold {
                *v = 0.0;
            }
        }
        out
    }
}

impl Thresholder for EdgeCountThreshold {
    fn threshold(&self, m: &Array2<f64>) -> Result<ThresholdOutcome> {
        let (p, cols) = m.dim();
        if p != cols {
            return Err(LrpcError::DimensionMismatch(format!(
                "Cannot threshold a {}x{} matrix",
                p, cols
            )));
        }
        if self.path_length < 2 {
            return Err(LrpcError::InvalidConfig(format!(
                "threshold path length must be at least 2, got {}",
                self.path_length
            )));
        }

        let magnitudes: Vec<f64> = (0..p)
            .flat_map(|i| ((i + 1)..p).map(move |j| (i, j)))
            .map(|(i, j)| m[[i, j]].abs())
            .filter(|v| *v > 0.0 && v.is_finite())
            .collect();

        if magnitudes.is_empty() {
            return Ok(ThresholdOutcome {
                matrix: m.clone(),
                threshold: 0.0,
                grid: Vec::new(),
                edge_counts: Vec::new(),
            });
        }

        let hi = magnitudes.iter().copied().fold(f64::MIN, f64::max);
        let lo = magnitudes.iter().copied().fold(f64::MAX, f64::min);
        let len = self.path_length;

        let grid = Array1::geomspace(hi, lo, len)
            .ok_or_else(|| {
                LrpcError::InvalidInput(format!("cannot build a threshold grid from {} to {}", hi, lo))
            })?
            .to_vec();
        let edge_counts: Vec<usize> = grid
            .iter()
            .map(|&thr| magnitudes.iter().filter(|&&v| v > thr).count())
            .collect();

        let first = edge_counts[0] as f64;
        let last = edge_counts[len - 1] as f64;
        let mut best = 0;
        let mut best_gap = f64::NEG_INFINITY;
        for (k, &count) in edge_counts.iter().enumerate() {
            let chord = first + (last - first) * k as f64 / (len - 1) as f64;
            let gap = (chord - count as f64).abs();
            if gap > best_gap {
                best_gap = gap;
                best = k;
            }
        }

        let threshold = grid[best];
        log::debug!(
            "threshold {:.4e} keeps {} of {} off-diagonal pairs",
            threshold,
            edge_counts[best],
            magnitudes.len()
        );

        Ok(ThresholdOutcome {
            matrix: Self::apply(m, threshold),
            threshold,
            grid,
            edge_counts,
        })
    }
}
