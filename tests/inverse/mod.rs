//! Tests for the inverse estimators and the repair utilities

pub mod adaptive;
pub mod direct;
pub mod repair_properties;
