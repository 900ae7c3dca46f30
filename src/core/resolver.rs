//! Candidate Resolver
//!
//! Picks the next word for a required node. Composite categories are tried in
//! preference order; inside a category candidates are ranked by mission
//! character occurrences, then by length. An optional typing-time budget
//! drops candidates that could not be typed before the turn runs out.

use std::cmp::Reverse;
use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::core::dictionary::Dictionary;
use crate::core::error::{Error, ValidationError};
use crate::core::flags::{WordCategory, WordFlags, WordPreference};
use crate::core::hangul;
use crate::core::node::{GameMode, IndexColumn};
use crate::database::{MissionFilter, WordQuery, WordRecord};

/// Remaining turn time is never assumed to be below this.
pub const MIN_TURN_BUDGET: Duration = Duration::from_millis(300);

// ============================================================================
// Request
// ============================================================================

/// Required node plus the alternative the initial sound law allows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeCondition {
    pub node: String,
    pub substitution: Option<String>,
}

impl NodeCondition {
    pub fn new(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            substitution: None,
        }
    }

    /// Condition that also accepts the initial-law form of `node`.
    pub fn with_initial_law(node: impl Into<String>) -> Self {
        let node = node.into();
        let substitution = hangul::initial_law_node(&node);
        Self { node, substitution }
    }

    /// Condition for the word following `previous` under `mode`.
    pub fn after(previous: &str, mode: GameMode) -> Result<Self, ValidationError> {
        let node = mode
            .tail(previous.trim())?
            .ok_or_else(|| ValidationError::UndefinedNode {
                word: previous.to_string(),
                mode: mode.to_string(),
            })?;
        Ok(Self::with_initial_law(node))
    }

    pub fn nodes(&self) -> Vec<String> {
        let mut nodes = vec![self.node.clone()];
        nodes.extend(self.substitution.iter().filter(|s| **s != self.node).cloned());
        nodes
    }
}

/// Which candidate classes the player allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathOptions {
    pub use_end_word: bool,
    pub use_attack_word: bool,
    /// Search requested by hand; the typing budget is not applied.
    pub manual_search: bool,
}

impl Default for PathOptions {
    fn default() -> Self {
        Self {
            use_end_word: true,
            use_attack_word: true,
            manual_search: false,
        }
    }
}

/// Typing-time budget for the current turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBudget {
    pub remaining: Duration,
    pub per_char_delay: Duration,
}

impl TimeBudget {
    /// True when `word` can be typed within the remaining time, never judged
    /// against less than `MIN_TURN_BUDGET`.
    pub fn fits(&self, word: &str) -> bool {
        let remaining = self.remaining.max(MIN_TURN_BUDGET);
        let chars = u32::try_from(word.chars().count()).unwrap_or(u32::MAX);
        self.per_char_delay.saturating_mul(chars) <= remaining
    }
}

/// Everything the resolver needs to pick a word.
#[derive(Debug, Clone)]
pub struct ResolveRequest {
    pub condition: NodeCondition,
    pub mode: GameMode,
    pub exclusions: HashSet<String>,
    pub preference: WordPreference,
    pub options: PathOptions,
    pub mission: Option<char>,
    pub budget: Option<TimeBudget>,
}

impl ResolveRequest {
    pub fn new(condition: NodeCondition, mode: GameMode) -> Self {
        Self {
            condition,
            mode,
            exclusions: HashSet::new(),
            preference: WordPreference::default(),
            options: PathOptions::default(),
            mission: None,
            budget: None,
        }
    }

    pub fn exclude<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclusions.extend(words.into_iter().map(Into::into));
        self
    }

    pub fn with_mission(mut self, mission: Option<char>) -> Self {
        self.mission = mission;
        self
    }

    pub fn with_budget(mut self, budget: TimeBudget) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn with_options(mut self, options: PathOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_preference(mut self, preference: WordPreference) -> Self {
        self.preference = preference;
        self
    }

    fn allows(&self, category: WordCategory) -> bool {
        !(category.is_end() && !self.options.use_end_word
            || category.is_attack() && !self.options.use_attack_word
            || category.has_mission() && self.mission.is_none())
    }

    fn query_for(&self, category: WordCategory, column: IndexColumn, limit: u32) -> WordQuery {
        let end = self.mode.end_flag();
        let attack = self.mode.attack_flag();

        let mut query = WordQuery::new(column, self.condition.nodes());
        if category.is_end() {
            query.require = end;
        } else if category.is_attack() {
            query.require = attack;
            query.forbid = end;
        } else {
            query.forbid = end | attack;
        }
        query.mission = match self.mission {
            Some(m) if category.has_mission() => MissionFilter::Contains(m),
            Some(m) => MissionFilter::Lacks(m),
            None => MissionFilter::Any,
        };
        let mut excluded: Vec<String> = self.exclusions.iter().cloned().collect();
        excluded.sort();
        query.exclude = excluded;
        query.limit = limit;
        query
    }
}

// ============================================================================
// Outcome
// ============================================================================

/// Selected word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FoundPath {
    pub word: String,
    pub category: WordCategory,
    pub flags: WordFlags,
    pub mission: Option<char>,
    pub mission_count: usize,
    pub options: PathOptions,
}

/// Why nothing was selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotFoundReport {
    /// Categories that had candidates, none of which fit the typing budget.
    pub time_limited: Vec<WordCategory>,
    pub candidates_seen: usize,
}

impl NotFoundReport {
    pub fn is_time_limited(&self) -> bool {
        !self.time_limited.is_empty()
    }
}

/// Resolver outcome.
#[derive(Debug)]
pub enum Resolution {
    Found(FoundPath),
    NotFound(NotFoundReport),
    Error(Error),
}

impl Resolution {
    pub fn word(&self) -> Option<&str> {
        match self {
            Resolution::Found(path) => Some(&path.word),
            _ => None,
        }
    }
}

fn mission_occurrences(word: &str, mission: Option<char>) -> usize {
    mission.map_or(0, |m| word.chars().filter(|c| *c == m).count())
}

// ============================================================================
// Resolution
// ============================================================================

impl Dictionary {
    /// Pick the best legal word for `request`.
    pub async fn resolve(&self, request: &ResolveRequest) -> Resolution {
        let column = request.mode.index_column(&request.condition.node);
        let mut tried = HashSet::new();
        let mut report = NotFoundReport::default();

        for &category in request.preference.categories() {
            if !tried.insert(category) || !request.allows(category) {
                continue;
            }

            let query = request.query_for(category, column, self.max_candidates);
            let mut candidates: Vec<WordRecord> = match self.store.find_words(&query).await {
                Ok(found) => found,
                Err(e) => {
                    error!(node = %request.condition.node, %category, error = %e, "Candidate lookup failed");
                    return Resolution::Error(e.into());
                }
            };
            if candidates.is_empty() {
                continue;
            }
            report.candidates_seen += candidates.len();

            // Stable: equal mission counts keep the store's length ordering.
            if request.mission.is_some() {
                candidates.sort_by_key(|r| Reverse(mission_occurrences(&r.word, request.mission)));
            }

            let pick = match request.budget {
                Some(budget) if !request.options.manual_search => {
                    candidates.iter().find(|r| budget.fits(&r.word))
                }
                _ => candidates.first(),
            };

            match pick {
                Some(record) => {
                    let flags = record.word_flags();
                    debug!(word = %record.word, %category, "Resolved next word");
                    return Resolution::Found(FoundPath {
                        word: record.word.clone(),
                        category: WordCategory::classify(flags, request.mode, &record.word, request.mission),
                        flags,
                        mission: request.mission,
                        mission_count: mission_occurrences(&record.word, request.mission),
                        options: request.options,
                    });
                }
                None => {
                    debug!(%category, candidates = candidates.len(), "All candidates exceed typing budget");
                    report.time_limited.push(category);
                }
            }
        }

        Resolution::NotFound(report)
    }
}
