//! Error Types
//!
//! Error taxonomy for the dictionary engine. Validation failures are raised
//! before any store access, store failures wrap the backing engine, and
//! verification failures come from the online existence oracle.

use thiserror::Error;

use crate::core::node::NodeCategory;

/// Input rejected before reaching the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Empty or blank argument passed to a derivation rule.
    #[error("Input is empty")]
    Empty,

    /// Word is shorter than the minimum playable length.
    #[error("Word '{word}' is too short ({len} < {min} characters)")]
    TooShort { word: String, len: usize, min: usize },

    /// Node string does not fit the width of its category.
    #[error("Node '{node}' has invalid width for {category} (expected at most {max} characters)")]
    NodeWidth {
        node: String,
        category: NodeCategory,
        max: usize,
    },

    /// The active mode defines no node for this word.
    #[error("No node is defined for '{word}' in {mode} mode")]
    UndefinedNode { word: String, mode: String },

    /// Preference list could not be decoded.
    #[error("Malformed preference list: {0}")]
    Preference(String),
}

/// Failure in the backing store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database engine error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Transaction could not be started, committed or rolled back.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Schema migration or legacy upgrade failure.
    #[error("Schema migration failed: {0}")]
    Migration(String),

    /// Store-level failure reported by a non-SQL backend.
    #[error("Store error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Create a transaction error with the given message.
    pub fn transaction(msg: impl Into<String>) -> Self {
        Self::Transaction(msg.into())
    }

    /// Create a migration error with the given message.
    pub fn migration(msg: impl Into<String>) -> Self {
        Self::Migration(msg.into())
    }

    /// Create a backend error with the given message.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// Failure while asking the online dictionary whether a word exists.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// Oracle kept answering "still searching" until the attempt bound ran out.
    #[error("Verification of '{word}' still ambiguous after {attempts} attempts")]
    Exhausted { word: String, attempts: u32 },

    /// HTTP or network failure talking to the oracle.
    #[error("Verifier transport error: {0}")]
    Transport(String),

    /// No verifier is configured but verification was requested.
    #[error("Online verification requested but no verifier is configured")]
    Unavailable,
}

impl From<reqwest::Error> for VerifyError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Configuration file failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Umbrella error for the engine's public operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Verify(#[from] VerifyError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Self::Store(StoreError::Database(err))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
