//! Node Derivation Rules
//!
//! Pure functions that map a word and a game mode to its head node (what the
//! word must start with) and tail node (what the next word must start with),
//! plus the eight node categories the dictionary keeps membership sets for.
//!
//! All positions are counted in Unicode scalar values, never bytes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::ValidationError;
use crate::core::flags::WordFlags;

// ============================================================================
// Game Modes
// ============================================================================

/// Chain rule family of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Next word starts with the last character of the previous one.
    #[default]
    #[serde(alias = "last_and_first")]
    Standard,
    /// Next word ends with the first character of the previous one.
    #[serde(alias = "first_and_last")]
    Reverse,
    /// Next word starts with the middle character of the previous one.
    #[serde(alias = "middle_and_first")]
    Middle,
    /// Two-character nodes for words of four or more characters.
    #[serde(alias = "kkutu")]
    Long,
}

impl GameMode {
    pub const ALL: [GameMode; 4] = [
        GameMode::Standard,
        GameMode::Reverse,
        GameMode::Middle,
        GameMode::Long,
    ];

    /// Head node of `word`: the node a candidate is looked up by.
    pub fn head(self, word: &str) -> Result<Option<String>, ValidationError> {
        match self {
            GameMode::Standard | GameMode::Middle => standard_head(word).map(Some),
            GameMode::Reverse => reverse_head(word).map(Some),
            GameMode::Long => long_head(word),
        }
    }

    /// Tail node of `word`: the node the following word must match.
    pub fn tail(self, word: &str) -> Result<Option<String>, ValidationError> {
        match self {
            GameMode::Standard => standard_tail(word).map(Some),
            GameMode::Reverse => reverse_tail(word).map(Some),
            GameMode::Middle => middle_tail(word),
            GameMode::Long => long_tail(word),
        }
    }

    /// Word table column holding the head node that `node` is matched against.
    pub fn index_column(self, node: &str) -> IndexColumn {
        match self {
            GameMode::Standard | GameMode::Middle => IndexColumn::Word,
            GameMode::Reverse => IndexColumn::ReverseWord,
            GameMode::Long if node.chars().count() == 2 => IndexColumn::Kkutu,
            GameMode::Long => IndexColumn::Word,
        }
    }

    /// Category holding end nodes for this mode.
    pub fn end_category(self) -> NodeCategory {
        match self {
            GameMode::Standard => NodeCategory::End,
            GameMode::Reverse => NodeCategory::ReverseEnd,
            GameMode::Middle => NodeCategory::MiddleEnd,
            GameMode::Long => NodeCategory::LongEnd,
        }
    }

    /// Category holding attack nodes for this mode.
    pub fn attack_category(self) -> NodeCategory {
        match self {
            GameMode::Standard => NodeCategory::Attack,
            GameMode::Reverse => NodeCategory::ReverseAttack,
            GameMode::Middle => NodeCategory::MiddleAttack,
            GameMode::Long => NodeCategory::LongAttack,
        }
    }

    pub fn end_flag(self) -> WordFlags {
        self.end_category().flag()
    }

    pub fn attack_flag(self) -> WordFlags {
        self.attack_category().flag()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GameMode::Standard => "standard",
            GameMode::Reverse => "reverse",
            GameMode::Middle => "middle",
            GameMode::Long => "long",
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "last_and_first" => Ok(GameMode::Standard),
            "reverse" | "first_and_last" => Ok(GameMode::Reverse),
            "middle" | "middle_and_first" => Ok(GameMode::Middle),
            "long" | "kkutu" => Ok(GameMode::Long),
            other => Err(format!("unknown game mode '{other}'")),
        }
    }
}

/// Head-node column of the word table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexColumn {
    /// `word_index`: first character.
    Word,
    /// `reverse_word_index`: last character.
    ReverseWord,
    /// `kkutu_index`: long-node head.
    Kkutu,
}

impl IndexColumn {
    pub fn column_name(self) -> &'static str {
        match self {
            IndexColumn::Word => "word_index",
            IndexColumn::ReverseWord => "reverse_word_index",
            IndexColumn::Kkutu => "kkutu_index",
        }
    }
}

// ============================================================================
// Derivation Rules
// ============================================================================

fn scalars(word: &str) -> Result<Vec<char>, ValidationError> {
    if word.trim().is_empty() {
        return Err(ValidationError::Empty);
    }
    Ok(word.chars().collect())
}

/// First character.
pub fn standard_head(word: &str) -> Result<String, ValidationError> {
    let chars = scalars(word)?;
    Ok(chars[0].to_string())
}

/// Last character.
pub fn standard_tail(word: &str) -> Result<String, ValidationError> {
    let chars = scalars(word)?;
    Ok(chars[chars.len() - 1].to_string())
}

/// Mirrored head is the standard tail.
pub fn reverse_head(word: &str) -> Result<String, ValidationError> {
    standard_tail(word)
}

/// Mirrored tail is the standard head.
pub fn reverse_tail(word: &str) -> Result<String, ValidationError> {
    standard_head(word)
}

/// Middle character, defined only for odd lengths above two.
pub fn middle_tail(word: &str) -> Result<Option<String>, ValidationError> {
    let chars = scalars(word)?;
    let len = chars.len();
    if len > 2 && len % 2 == 1 {
        Ok(Some(chars[(len - 1) / 2].to_string()))
    } else {
        Ok(None)
    }
}

/// First two characters for four or more, first character for exactly three.
pub fn long_head(word: &str) -> Result<Option<String>, ValidationError> {
    let chars = scalars(word)?;
    Ok(match chars.len() {
        0..=2 => None,
        3 => Some(chars[0].to_string()),
        _ => Some(chars[..2].iter().collect()),
    })
}

/// Characters at `len-3` and `len-2` for four or more, last character for exactly three.
pub fn long_tail(word: &str) -> Result<Option<String>, ValidationError> {
    let chars = scalars(word)?;
    let len = chars.len();
    Ok(match len {
        0..=2 => None,
        3 => Some(chars[2].to_string()),
        _ => Some(chars[len - 3..len - 1].iter().collect()),
    })
}

// ============================================================================
// Node Categories
// ============================================================================

/// Whether a node category blocks the opponent or merely narrows their options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    /// No word starts with this node: the chain ends.
    End,
    /// Few words start with this node.
    Attack,
}

/// One (mode, role) pair. Discriminants match the word flag bit positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum NodeCategory {
    End = 0,
    Attack = 1,
    ReverseEnd = 2,
    ReverseAttack = 3,
    MiddleEnd = 4,
    MiddleAttack = 5,
    LongEnd = 6,
    LongAttack = 7,
}

impl NodeCategory {
    pub const ALL: [NodeCategory; 8] = [
        NodeCategory::End,
        NodeCategory::Attack,
        NodeCategory::ReverseEnd,
        NodeCategory::ReverseAttack,
        NodeCategory::MiddleEnd,
        NodeCategory::MiddleAttack,
        NodeCategory::LongEnd,
        NodeCategory::LongAttack,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Node table backing this category.
    pub fn table_name(self) -> &'static str {
        match self {
            NodeCategory::End => "endword_list",
            NodeCategory::Attack => "attackword_list",
            NodeCategory::ReverseEnd => "reverse_endword_list",
            NodeCategory::ReverseAttack => "reverse_attackword_list",
            NodeCategory::MiddleEnd => "middle_endword_list",
            NodeCategory::MiddleAttack => "middle_attackword_list",
            NodeCategory::LongEnd => "kkutu_endword_list",
            NodeCategory::LongAttack => "kkutu_attackword_list",
        }
    }

    /// Word flag set on words whose tail node is in this category.
    pub fn flag(self) -> WordFlags {
        WordFlags::from_bits_truncate(1 << self.index())
    }

    pub fn mode(self) -> GameMode {
        match self {
            NodeCategory::End | NodeCategory::Attack => GameMode::Standard,
            NodeCategory::ReverseEnd | NodeCategory::ReverseAttack => GameMode::Reverse,
            NodeCategory::MiddleEnd | NodeCategory::MiddleAttack => GameMode::Middle,
            NodeCategory::LongEnd | NodeCategory::LongAttack => GameMode::Long,
        }
    }

    pub fn role(self) -> NodeRole {
        match self {
            NodeCategory::End
            | NodeCategory::ReverseEnd
            | NodeCategory::MiddleEnd
            | NodeCategory::LongEnd => NodeRole::End,
            _ => NodeRole::Attack,
        }
    }

    /// Maximum node width in characters.
    pub fn max_width(self) -> usize {
        match self.mode() {
            GameMode::Long => 2,
            _ => 1,
        }
    }

    /// Check that `node` fits this category's width.
    pub fn validate(self, node: &str) -> Result<(), ValidationError> {
        let width = node.chars().count();
        if width == 0 {
            return Err(ValidationError::Empty);
        }
        if width > self.max_width() {
            return Err(ValidationError::NodeWidth {
                node: node.to_string(),
                category: self,
                max: self.max_width(),
            });
        }
        Ok(())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeCategory::End => "end",
            NodeCategory::Attack => "attack",
            NodeCategory::ReverseEnd => "reverse_end",
            NodeCategory::ReverseAttack => "reverse_attack",
            NodeCategory::MiddleEnd => "middle_end",
            NodeCategory::MiddleAttack => "middle_attack",
            NodeCategory::LongEnd => "long_end",
            NodeCategory::LongAttack => "long_attack",
        }
    }
}

impl fmt::Display for NodeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        NodeCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| format!("unknown node category '{s}'"))
    }
}

/// Set of node categories requested by a node batch job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeCategories(u8);

impl NodeCategories {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn all() -> Self {
        Self(u8::MAX)
    }

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub fn with(self, category: NodeCategory) -> Self {
        Self(self.0 | (1 << category.index()))
    }

    pub fn contains(self, category: NodeCategory) -> bool {
        self.0 & (1 << category.index()) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = NodeCategory> {
        NodeCategory::ALL.into_iter().filter(move |c| self.contains(*c))
    }
}

impl FromIterator<NodeCategory> for NodeCategories {
    fn from_iter<I: IntoIterator<Item = NodeCategory>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

impl FromStr for NodeCategories {
    type Err = String;

    /// Parses a comma separated list of category names, or `all`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::all());
        }
        s.split(',')
            .filter(|part| !part.trim().is_empty())
            .map(NodeCategory::from_str)
            .collect()
    }
}
