//! Property-based tests for the word-chain engine
//!
//! This module contains property-based tests using the proptest framework.
//! Property tests verify invariants that should hold for all inputs, rather
//! than testing specific cases.
//!
//! ## Running Property Tests
//!
//! Run all property tests:
//! ```sh
//! cargo test property --release
//! ```
//!
//! Run a specific property test module:
//! ```sh
//! cargo test property::node_rules_props --release
//! ```
//!
//! ## Test Modules
//!
//! - `node_rules_props`: Tests for per-mode node derivation
//!   - Standard and reverse nodes are single characters at the word ends
//!   - Middle nodes exist only for odd lengths above two
//!   - Long nodes never exceed two characters
//!   - Derived nodes always fit their category width
//!
//! - `preference_props`: Tests for flags and preference encoding
//!   - Encoding then decoding a preference is lossless
//!   - Malformed lists are rejected, never truncated
//!   - Flag categories map back to the same bits
//!   - Initial-law substitution only rewrites the first syllable
//!
//! ## Property Testing Philosophy
//!
//! Property-based testing helps find edge cases that manual test cases might miss.
//! The proptest framework will:
//!
//! 1. Generate random inputs based on defined strategies
//! 2. Test each property with many different inputs
//! 3. If a failure is found, shrink the input to find the minimal failing case
//! 4. Store failing cases in a regression file for future testing

mod node_rules_props;
