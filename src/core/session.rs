//! Game Session Tracking
//!
//! Remembers what happened during one game: words already played, words the
//! game refused, and words the dictionary should learn or forget. At the end
//! of a game `flush` writes the learned changes back.

use std::collections::HashSet;

use serde::Serialize;
use tracing::info;

use crate::core::batch::{CancelToken, FlagSource};
use crate::core::dictionary::Dictionary;
use crate::core::error::{Result, ValidationError};
use crate::core::node::GameMode;
use crate::core::resolver::{NodeCondition, ResolveRequest};

/// What a flush wrote back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateSummary {
    pub added: usize,
    pub duplicates: usize,
    pub removed: usize,
    pub errors: usize,
}

/// Per-game word bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct PathSession {
    mode: GameMode,
    /// Played words may be played again.
    return_mode: bool,
    used: HashSet<String>,
    unsupported: HashSet<String>,
    inexistent: HashSet<String>,
    pending_new: Vec<String>,
    pending_removal: Vec<String>,
}

impl PathSession {
    pub fn new(mode: GameMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn with_return_mode(mut self, enabled: bool) -> Self {
        self.return_mode = enabled;
        self
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: GameMode) {
        self.mode = mode;
    }

    /// Record a played word; queue it for learning if the dictionary lacks it.
    ///
    /// Returns true if the word was unknown.
    pub async fn observe_word(&mut self, dictionary: &Dictionary, word: &str) -> Result<bool> {
        let word = word.trim();
        if word.is_empty() {
            return Ok(false);
        }
        self.used.insert(word.to_string());

        let unknown = dictionary.store().get_word(word).await?.is_none();
        if unknown && !self.inexistent.contains(word) && !self.pending_new.iter().any(|w| w == word) {
            self.pending_new.push(word.to_string());
        }
        Ok(unknown)
    }

    /// The game refused `word` for this mode; never suggest it again this game.
    pub fn mark_unsupported(&mut self, word: &str) {
        self.unsupported.insert(word.trim().to_string());
    }

    /// The game says `word` is not a word; exclude it and queue its removal.
    pub fn mark_inexistent(&mut self, word: &str) {
        let word = word.trim().to_string();
        self.pending_new.retain(|w| *w != word);
        if self.inexistent.insert(word.clone()) {
            self.pending_removal.push(word);
        }
    }

    /// Words the resolver must not suggest.
    pub fn exclusions(&self) -> HashSet<String> {
        let mut excluded: HashSet<String> = self.unsupported.union(&self.inexistent).cloned().collect();
        if !self.return_mode {
            excluded.extend(self.used.iter().cloned());
        }
        excluded
    }

    /// Request for the word following `previous`, with this session's exclusions.
    pub fn request_after(&self, previous: &str) -> std::result::Result<ResolveRequest, ValidationError> {
        let condition = NodeCondition::after(previous, self.mode)?;
        Ok(ResolveRequest::new(condition, self.mode).exclude(self.exclusions()))
    }

    /// Queued (additions, removals).
    pub fn pending(&self) -> (usize, usize) {
        (self.pending_new.len(), self.pending_removal.len())
    }

    /// Write queued additions and removals. Queues are emptied either way.
    pub async fn flush(&mut self, dictionary: &Dictionary) -> Result<UpdateSummary> {
        let additions = std::mem::take(&mut self.pending_new);
        let removals = std::mem::take(&mut self.pending_removal);
        let cancel = CancelToken::new();
        let mut summary = UpdateSummary::default();

        if !additions.is_empty() {
            let count = dictionary
                .add_words(additions.as_slice(), FlagSource::Indexed, false, &cancel)
                .await?;
            summary.added = count.total;
            summary.duplicates = count.duplicates;
            summary.errors += count.errors;
        }
        if !removals.is_empty() {
            let count = dictionary.batch_remove_words(removals.as_slice(), &cancel).await?;
            summary.removed = count.total;
            summary.errors += count.errors;
        }

        info!(?summary, "Session dictionary update flushed");
        Ok(summary)
    }

    /// Forget the played and refused words, keeping queued updates.
    pub fn new_game(&mut self) {
        self.used.clear();
        self.unsupported.clear();
        self.inexistent.clear();
    }
}
