//! Integration tests for the lrpc-rs library
//!
//! This module organizes all integration tests that test the library as a whole,
//! rather than individual components.

// Fixed-eta and cross-validated runs of the full assembler
pub mod end_to_end;
