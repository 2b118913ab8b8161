//! Utility functions and helpers for the lrpc-rs library.

pub mod linalg;
pub mod matrix_convert;
pub mod parallel;

// Re-export commonly used utilities
pub use matrix_convert::{faer_to_ndarray, ndarray_to_faer};
pub use parallel::{default_core_count, WorkerPool};
