//! Crate test suite
//!
//! - `common`: database and dictionary fixtures
//! - `mocks`: fault-injecting store and verifier doubles
//! - `database`: SQLite store operations and legacy upgrade
//! - `pipeline`: batch jobs, resolution, sessions and integrity checks
//! - `property`: proptest invariants for the pure node rules
//! - `integration`: HTTP verifier against a mock server

mod common;
mod mocks;
mod property;
