//! Word Flags and Preference Ordering
//!
//! `WordFlags` is the persisted per-word category bitset. `WordCategory` is the
//! composite ranking class (end / attack / mission) a candidate falls into for
//! one mode, and `WordPreference` orders those classes for the resolver.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

use crate::core::error::ValidationError;
use crate::core::node::{GameMode, NodeCategory};

// ============================================================================
// Word Flags
// ============================================================================

/// Category bitset stored in `word_list.flags`. Bit values are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WordFlags(u16);

impl WordFlags {
    pub const NONE: WordFlags = WordFlags(0);
    pub const END_WORD: WordFlags = WordFlags(1 << 0);
    pub const ATTACK_WORD: WordFlags = WordFlags(1 << 1);
    pub const REVERSE_END_WORD: WordFlags = WordFlags(1 << 2);
    pub const REVERSE_ATTACK_WORD: WordFlags = WordFlags(1 << 3);
    pub const MIDDLE_END_WORD: WordFlags = WordFlags(1 << 4);
    pub const MIDDLE_ATTACK_WORD: WordFlags = WordFlags(1 << 5);
    pub const LONG_END_WORD: WordFlags = WordFlags(1 << 6);
    pub const LONG_ATTACK_WORD: WordFlags = WordFlags(1 << 7);

    const MASK: u16 = 0xFF;

    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Drop any bits outside the eight known categories.
    pub const fn from_bits_truncate(bits: u16) -> Self {
        Self(bits & Self::MASK)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True when every bit of `other` is set.
    pub const fn contains(self, other: WordFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// True when any bit of `other` is set.
    pub const fn intersects(self, other: WordFlags) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: WordFlags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: WordFlags) {
        self.0 &= !other.0;
    }

    /// Node categories whose flag is set.
    pub fn categories(self) -> impl Iterator<Item = NodeCategory> {
        NodeCategory::ALL
            .into_iter()
            .filter(move |c| self.contains(c.flag()))
    }
}

impl BitOr for WordFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for WordFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for WordFlags {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl From<WordFlags> for i64 {
    fn from(flags: WordFlags) -> i64 {
        i64::from(flags.0)
    }
}

// ============================================================================
// Composite Categories
// ============================================================================

/// Ranking class of a candidate word: end/attack role plus mission match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct WordCategory(u8);

impl WordCategory {
    const END_BIT: u8 = 1;
    const ATTACK_BIT: u8 = 2;
    const MISSION_BIT: u8 = 4;

    pub const PLAIN: WordCategory = WordCategory(0);
    pub const END: WordCategory = WordCategory(Self::END_BIT);
    pub const ATTACK: WordCategory = WordCategory(Self::ATTACK_BIT);
    pub const MISSION: WordCategory = WordCategory(Self::MISSION_BIT);
    pub const END_MISSION: WordCategory = WordCategory(Self::END_BIT | Self::MISSION_BIT);
    pub const ATTACK_MISSION: WordCategory = WordCategory(Self::ATTACK_BIT | Self::MISSION_BIT);

    /// The six valid composites. End and attack are mutually exclusive.
    pub fn from_bits(bits: u8) -> Option<Self> {
        let both = Self::END_BIT | Self::ATTACK_BIT;
        if bits > 7 || bits & both == both {
            None
        } else {
            Some(Self(bits))
        }
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn is_end(self) -> bool {
        self.0 & Self::END_BIT != 0
    }

    pub fn is_attack(self) -> bool {
        self.0 & Self::ATTACK_BIT != 0
    }

    pub fn has_mission(self) -> bool {
        self.0 & Self::MISSION_BIT != 0
    }

    /// Classify a stored word for `mode`. End wins over attack.
    pub fn classify(flags: WordFlags, mode: GameMode, word: &str, mission: Option<char>) -> Self {
        let mut bits = if flags.contains(mode.end_flag()) {
            Self::END_BIT
        } else if flags.contains(mode.attack_flag()) {
            Self::ATTACK_BIT
        } else {
            0
        };
        if mission.is_some_and(|m| word.contains(m)) {
            bits |= Self::MISSION_BIT;
        }
        Self(bits)
    }
}

impl fmt::Display for WordCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let role = if self.is_end() {
            "end"
        } else if self.is_attack() {
            "attack"
        } else if self.has_mission() {
            return f.write_str("mission");
        } else {
            "plain"
        };
        if self.has_mission() {
            write!(f, "{role}+mission")
        } else {
            f.write_str(role)
        }
    }
}

// ============================================================================
// Preference Ordering
// ============================================================================

const PREFERENCE_DELIMITER: &str = ",";

/// Ordered list of composite categories tried by the resolver.
///
/// Persisted as the category bit values joined by `,`, e.g. `5,1,6,2,4,0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WordPreference(Vec<WordCategory>);

impl Default for WordPreference {
    fn default() -> Self {
        Self(vec![
            WordCategory::END_MISSION,
            WordCategory::END,
            WordCategory::ATTACK_MISSION,
            WordCategory::ATTACK,
            WordCategory::MISSION,
            WordCategory::PLAIN,
        ])
    }
}

impl WordPreference {
    pub fn new(order: Vec<WordCategory>) -> Self {
        Self(order)
    }

    pub fn categories(&self) -> &[WordCategory] {
        &self.0
    }

    pub fn encode(&self) -> String {
        self.0
            .iter()
            .map(|c| c.bits().to_string())
            .collect::<Vec<_>>()
            .join(PREFERENCE_DELIMITER)
    }

    pub fn decode(encoded: &str) -> Result<Self, ValidationError> {
        if encoded.trim().is_empty() {
            return Err(ValidationError::Preference("empty preference list".into()));
        }
        encoded
            .split(PREFERENCE_DELIMITER)
            .map(|part| {
                let part = part.trim();
                part.parse::<u8>()
                    .ok()
                    .and_then(WordCategory::from_bits)
                    .ok_or_else(|| ValidationError::Preference(format!("invalid category '{part}'")))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl TryFrom<String> for WordPreference {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::decode(&value)
    }
}

impl From<WordPreference> for String {
    fn from(value: WordPreference) -> String {
        value.encode()
    }
}
