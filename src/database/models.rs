//! Database Models
//!
//! Row types for the word table and the query description the resolver
//! hands to the store.

use serde::{Deserialize, Serialize};

use crate::core::error::ValidationError;
use crate::core::flags::WordFlags;
use crate::core::node::{self, IndexColumn};

// ============================================================================
// Word Rows
// ============================================================================

/// Stored word row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct WordRecord {
    pub seq: i64,
    pub word: String,
    pub word_index: String,
    pub reverse_word_index: String,
    pub kkutu_index: String,
    pub flags: i64,
}

impl WordRecord {
    pub fn word_flags(&self) -> WordFlags {
        WordFlags::from_bits_truncate(u16::try_from(self.flags).unwrap_or(0))
    }

    pub fn char_len(&self) -> usize {
        self.word.chars().count()
    }
}

/// Word ready to be written: text, derived head nodes and final flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordEntry {
    pub word: String,
    pub word_index: String,
    pub reverse_word_index: String,
    pub kkutu_index: String,
    pub flags: WordFlags,
}

impl WordEntry {
    /// Derive all three head nodes of `word`.
    pub fn derive(word: &str, flags: WordFlags) -> Result<Self, ValidationError> {
        Ok(Self {
            word: word.to_string(),
            word_index: node::standard_head(word)?,
            reverse_word_index: node::reverse_head(word)?,
            kkutu_index: node::long_head(word)?.unwrap_or_default(),
            flags,
        })
    }

    /// True when the stored row disagrees with this entry on any derived column.
    pub fn differs_from(&self, record: &WordRecord) -> bool {
        self.word_index != record.word_index
            || self.reverse_word_index != record.reverse_word_index
            || self.kkutu_index != record.kkutu_index
            || self.flags != record.word_flags()
    }
}

// ============================================================================
// Queries
// ============================================================================

/// Mission-character constraint of a candidate query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissionFilter {
    #[default]
    Any,
    Contains(char),
    Lacks(char),
}

/// Candidate lookup: head node match plus flag, mission and exclusion filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordQuery {
    pub column: IndexColumn,
    /// Accepted head nodes (the required node and its substitution).
    pub nodes: Vec<String>,
    /// At least one of these flags must be set. Empty means no requirement.
    pub require: WordFlags,
    /// None of these flags may be set.
    pub forbid: WordFlags,
    pub mission: MissionFilter,
    pub exclude: Vec<String>,
    pub limit: u32,
}

impl WordQuery {
    pub fn new(column: IndexColumn, nodes: Vec<String>) -> Self {
        Self {
            column,
            nodes,
            require: WordFlags::NONE,
            forbid: WordFlags::NONE,
            mission: MissionFilter::Any,
            exclude: Vec::new(),
            limit: 128,
        }
    }
}
