//! Synthetic data for tests and benchmarks.
//!
//! Series are returned p×n: rows are variables, columns are time points.

use faer::linalg::solvers::Llt;
use faer::Side;
use ndarray::{Array1, Array2};
use rand::Rng;
use rand_distr::{Distribution, Normal, StandardNormal, StudentT};

use crate::error::{LrpcError, Result};
use crate::utils::matrix_convert::{faer_to_ndarray, ndarray_to_faer};

/// Distribution of the VAR innovations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Innovations {
    /// Normal with the given standard deviation
    Gaussian {
        /// Standard deviation
        sd: f64,
    },

    /// Student-t with `df` degrees of freedom, multiplied by `scale`
    StudentT {
        /// Degrees of freedom
        df: f64,
        /// Scale factor
        scale: f64,
    },
}

impl Innovations {
    fn draw<R: Rng + ?Sized>(&self, rng: &mut R, len: usize) -> Result<Array1<f64>> {
        match *self {
            Innovations::Gaussian { sd } => {
                let dist = Normal::new(0.0, sd).map_err(|e| {
                    LrpcError::InvalidInput(format!("invalid innovation distribution: {}", e))
                })?;
                Ok(Array1::from_shape_fn(len, |_| dist.sample(rng)))
            }
            Innovations::StudentT { df, scale } => {
                let dist = StudentT::new(df).map_err(|e| {
                    LrpcError::InvalidInput(format!("invalid innovation distribution: {}", e))
                })?;
                Ok(Array1::from_shape_fn(len, |_| scale * dist.sample(rng)))
            }
        }
    }
}

/// Tridiagonal precision matrix with unit diagonal and `rho` on the first
/// off-diagonals. Positive definite for `|rho| < 0.5`.
pub fn banded_precision(p: usize, rho: f64) -> Array2<f64> {
    Array2::from_shape_fn((p, p), |(i, j)| {
        if i == j {
            1.0
        } else if i.abs_diff(j) == 1 {
            rho
        } else {
            0.0
        }
    })
}

/// Lower-triangular `L` with `L Lᵗ = a` for a positive definite `a`.
///
/// Only the lower triangle of `a` is read.
pub fn cholesky_factor(a: &Array2<f64>) -> Result<Array2<f64>> {
    let n = a.nrows();
    if a.ncols() != n {
        return Err(LrpcError::DimensionMismatch(format!(
            "Matrix must be square, got shape {:?}",
            a.shape()
        )));
    }

    let llt = Llt::new(ndarray_to_faer(a.view()).as_ref(), Side::Lower).map_err(|err| {
        LrpcError::LinearAlgebraError(format!("Matrix is not positive definite: {}", err))
    })?;
    Ok(faer_to_ndarray(llt.L()))
}

/// `n` independent draws from `N(0, covariance)`.
pub fn simulate_gaussian<R: Rng + ?Sized>(
    n: usize,
    covariance: &Array2<f64>,
    rng: &mut R,
) -> Result<Array2<f64>> {
    let l = cholesky_factor(covariance)?;
    let p = l.nrows();
    let z: Array2<f64> = Array2::from_shape_fn((p, n), |_| StandardNormal.sample(rng));
    Ok(l.dot(&z))
}

/// `n` independent draws from `N(0, precision⁻¹)`, without forming the inverse.
pub fn simulate_from_precision<R: Rng + ?Sized>(
    n: usize,
    precision: &Array2<f64>,
    rng: &mut R,
) -> Result<Array2<f64>> {
    let l = cholesky_factor(precision)?;
    let p = l.nrows();
    let mut x: Array2<f64> = Array2::from_shape_fn((p, n), |_| StandardNormal.sample(rng));

    // Back substitution Lᵗ x = z, column by column
    for mut col in x.columns_mut() {
        for i in (0..p).rev() {
            let mut v = col[i];
            for k in (i + 1)..p {
                v -= l[[k, i]] * col[k];
            }
            col[i] = v / l[[i, i]];
        }
    }
    Ok(x)
}

/// Diagonal VAR(1) `x_t = coefficient · x_{t−1} + e_t` with independent
/// innovations, after discarding `burn_in` initial steps.
pub fn simulate_var1<R: Rng + ?Sized>(
    n: usize,
    p: usize,
    coefficient: f64,
    innovations: Innovations,
    burn_in: usize,
    rng: &mut R,
) -> Result<Array2<f64>> {
    if !(coefficient.abs() < 1.0) {
        return Err(LrpcError::InvalidInput(format!(
            "VAR coefficient {} is not stationary",
            coefficient
        )));
    }

    let mut out = Array2::zeros((p, n));
    let mut state = Array1::<f64>::zeros(p);
    for t in 0..(burn_in + n) {
        state = &state * coefficient + innovations.draw(rng, p)?;
        if t >= burn_in {
            out.column_mut(t - burn_in).assign(&state);
        }
    }
    Ok(out)
}
