//! Common Test Utilities
//!
//! Shared fixtures for test modules:
//! - Database and dictionary creation (`fixtures`)
//! - Small word lists used across the pipeline tests

pub mod fixtures;

pub use fixtures::*;
