/// Wordchain - word-chain dictionary engine
///
/// Persistent word/node dictionary for word-chain games: per-mode node
/// derivation, transactional batch ingestion, and next-word resolution.

pub mod config;
pub mod core;
pub mod database;

#[cfg(test)]
mod tests;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
