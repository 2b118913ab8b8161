//! # lrpc-rs
//!
//! `lrpc-rs` estimates sparse precision matrices of high-dimensional time
//! series by column-wise constrained L1 minimization, and turns them into
//! long-run partial correlations of the idiosyncratic component of a factor
//! + VAR model.
//!
//! The library provides:
//! - Direct and two-stage adaptive inverse estimators, one linear program per column
//! - Symmetrization and diagonal repair of the assembled estimate
//! - A cross-validated regularization path with contiguous, time-ordered folds
//! - The assembly of Delta, Omega and their partial correlations from a fitted model
//!
//! ## Basic Usage
//!
//! ```
//! use lrpc_rs::inverse::DirectInverse;
//! use ndarray::arr2;
//!
//! let gamma = arr2(&[[1.0, 0.2], [0.2, 1.0]]);
//! let estimate = DirectInverse::new().estimate(&gamma, 0.05).unwrap();
//! assert_eq!(estimate.matrix[[0, 1]], estimate.matrix[[1, 0]]);
//! ```

// Public modules
pub mod error;

pub mod collaborators;
pub mod cv;
pub mod inverse;
pub mod lrpc;
pub mod simulate;
pub mod utils;

// Re-exports for convenience
pub use collaborators::{DynamicEstimate, DynamicEstimator, ThresholdOutcome, Thresholder};
pub use cv::{CrossValidator, CvConfig, CvResult};
pub use error::{LrpcError, Result};
pub use inverse::{
    partial_correlation, AdaptiveInverse, DirectInverse, InverseEstimate, InverseEstimator,
    Symmetrize,
};
pub use lrpc::{var_transform, FactorVarFit, LongRunPartialCorrelation, LrpcConfig, LrpcResult};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
