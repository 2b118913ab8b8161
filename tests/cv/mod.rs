//! Tests for the cross-validated regularization path

pub mod cross_validation;
