//! Held-out loss for a candidate inverse.

use ndarray::Array2;

use crate::utils::linalg::singular_values;

/// Loss assigned when the product `D Γ_test` has no usable log-determinant.
pub const CV_PENALTY_LOSS: f64 = 1e12;

/// Stein loss `tr(D Γ) − log det(D Γ) − p`.
///
/// The log-determinant is the sum of the logarithms of the singular values
/// of `D Γ`. A zero or non-finite singular value, a failed decomposition or
/// a non-finite result gives [`CV_PENALTY_LOSS`]; this function never errors.
/// The loss is zero when `D` is the exact inverse of `Γ`.
pub fn stein_loss(d: &Array2<f64>, gamma_test: &Array2<f64>) -> f64 {
    let p = d.nrows();
    if d.dim() != gamma_test.dim() || d.ncols() != p {
        return CV_PENALTY_LOSS;
    }

    let prod = d.dot(gamma_test);
    let trace = prod.diag().sum();

    let sigma = match singular_values(prod.view()) {
        Ok(sigma) => sigma,
        Err(_) => return CV_PENALTY_LOSS,
    };
    if sigma.iter().any(|s| !(*s > 0.0) || !s.is_finite()) {
        return CV_PENALTY_LOSS;
    }

    let log_det: f64 = sigma.iter().map(|s| s.ln()).sum();
    let loss = trace - log_det - p as f64;
    if loss.is_finite() {
        loss
    } else {
        CV_PENALTY_LOSS
    }
}

/// Index of the first minimum of `losses`; NaN entries are never selected.
pub fn first_minimum(losses: &[f64]) -> usize {
    let mut best = 0;
    let mut best_loss = f64::INFINITY;
    for (k, &loss) in losses.iter().enumerate() {
        if loss < best_loss {
            best = k;
            best_loss = loss;
        }
    }
    best
}
