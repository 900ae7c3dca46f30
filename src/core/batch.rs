//! Batch Ingestion and Retraction
//!
//! Bulk add/remove of words and raw node values. Each job runs in a single
//! store transaction; a failing item is logged and counted without touching
//! its siblings, and the job always reports a count summary.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::core::dictionary::Dictionary;
use crate::core::error::{Result, ValidationError, VerifyError};
use crate::core::flags::WordFlags;
use crate::core::node::{NodeCategories, NodeCategory};
use crate::core::node_index::NewNodes;
use crate::core::verify::{verify_word, WordVerifier};
use crate::database::{StoreTransaction, WordEntry};

/// Shortest word accepted into the dictionary.
pub const MIN_WORD_LENGTH: usize = 2;

// ============================================================================
// Cancellation
// ============================================================================

/// Cooperative cancellation flag checked between batch items.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Counters
// ============================================================================

/// Per-category success tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryTally([usize; 8]);

impl CategoryTally {
    pub fn get(&self, category: NodeCategory) -> usize {
        self.0[category.index()]
    }

    pub fn add(&mut self, category: NodeCategory, n: usize) {
        self.0[category.index()] += n;
    }

    /// Count once for every category flag set in `flags`.
    pub fn add_flags(&mut self, flags: WordFlags) {
        for category in flags.categories() {
            self.add(category, 1);
        }
    }
}

/// Result of a word batch job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordCount {
    /// Words inserted or deleted.
    pub total: usize,
    pub per_category: CategoryTally,
    /// Words already present (add).
    pub duplicates: usize,
    /// Words that were not there to delete (remove).
    pub missing: usize,
    /// Words the online dictionary confirmed absent.
    pub unverified: usize,
    pub errors: usize,
    pub new_end_nodes: usize,
    pub new_attack_nodes: usize,
    pub committed: bool,
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl WordCount {
    fn start() -> Self {
        let now = Utc::now();
        Self {
            total: 0,
            per_category: CategoryTally::default(),
            duplicates: 0,
            missing: 0,
            unverified: 0,
            errors: 0,
            new_end_nodes: 0,
            new_attack_nodes: 0,
            committed: false,
            cancelled: false,
            started_at: now,
            finished_at: now,
        }
    }

    fn record_new_nodes(&mut self, nodes: NewNodes) {
        self.new_end_nodes += nodes.end;
        self.new_attack_nodes += nodes.attack;
    }
}

/// Result of a node batch job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeCount {
    /// (node, category) memberships added or removed.
    pub total: usize,
    pub per_category: CategoryTally,
    pub duplicates: usize,
    pub missing: usize,
    pub errors: usize,
    pub committed: bool,
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl NodeCount {
    fn start() -> Self {
        let now = Utc::now();
        Self {
            total: 0,
            per_category: CategoryTally::default(),
            duplicates: 0,
            missing: 0,
            errors: 0,
            committed: false,
            cancelled: false,
            started_at: now,
            finished_at: now,
        }
    }
}

/// Split newline-delimited input into trimmed, non-blank entries.
pub fn parse_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

async fn commit_logged(tx: Box<dyn StoreTransaction>, job: &'static str) -> bool {
    match tx.commit().await {
        Ok(()) => true,
        Err(e) => {
            error!(job, error = %e, "Batch commit failed; reported counts were not persisted");
            false
        }
    }
}

/// How the flags of an added word are decided.
#[derive(Debug, Clone, Copy)]
pub(crate) enum FlagSource {
    /// Caller-supplied floor, widened by the index; unknown claimed nodes are registered.
    Widen(WordFlags),
    /// Whatever the index already implies; nothing is registered.
    Indexed,
}

// ============================================================================
// Jobs
// ============================================================================

impl Dictionary {
    /// Add `words` with `flags` as the minimum category set.
    pub async fn batch_add_words<S: AsRef<str> + Sync>(
        &self,
        words: &[S],
        flags: WordFlags,
        verify_online: bool,
        cancel: &CancelToken,
    ) -> Result<WordCount> {
        self.add_words(words, FlagSource::Widen(flags), verify_online, cancel)
            .await
    }

    pub(crate) async fn add_words<S: AsRef<str> + Sync>(
        &self,
        words: &[S],
        source: FlagSource,
        verify_online: bool,
        cancel: &CancelToken,
    ) -> Result<WordCount> {
        let verifier = if verify_online {
            Some(self.verifier.as_deref().ok_or(VerifyError::Unavailable)?)
        } else {
            None
        };

        let mut count = WordCount::start();
        info!(words = words.len(), ?source, verify_online, "Word addition started");

        // Validation and online checks run before the writer gate is taken.
        let mut accepted = Vec::with_capacity(words.len());
        for raw in words {
            if cancel.is_cancelled() {
                count.cancelled = true;
                break;
            }
            let word = raw.as_ref().trim();
            if word.is_empty() {
                continue;
            }
            match self.screen_word(word, verifier).await {
                Ok(true) => accepted.push(word),
                Ok(false) => {
                    debug!(word, "Word not found in online dictionary, skipped");
                    count.unverified += 1;
                }
                Err(e) => {
                    warn!(word, error = %e, "Word rejected");
                    count.errors += 1;
                }
            }
        }

        if count.cancelled {
            warn!("Word addition cancelled before writing");
            count.finished_at = Utc::now();
            return Ok(count);
        }

        let mut tx = self.store.begin().await?;
        let mut stage = self.index.stage();
        for word in accepted {
            if cancel.is_cancelled() {
                count.cancelled = true;
                warn!(word, "Word addition cancelled");
                break;
            }
            let flags = match source {
                FlagSource::Widen(floor) => stage.widen_flags(tx.as_mut(), word, floor).await,
                FlagSource::Indexed => self
                    .index
                    .compute_flags(word)
                    .map(|f| (f, NewNodes::default()))
                    .map_err(Into::into),
            };
            let (flags, new_nodes) = match flags {
                Ok(widened) => widened,
                Err(e) => {
                    warn!(word, error = %e, "Failed to derive word flags");
                    count.errors += 1;
                    continue;
                }
            };
            count.record_new_nodes(new_nodes);

            let inserted = match WordEntry::derive(word, flags) {
                Ok(entry) => tx.add_word(&entry).await.map_err(Into::into),
                Err(e) => Err(crate::core::error::Error::from(e)),
            };
            match inserted {
                Ok(true) => {
                    count.total += 1;
                    count.per_category.add_flags(flags);
                }
                Ok(false) => count.duplicates += 1,
                Err(e) => {
                    warn!(word, error = %e, "Failed to add word");
                    count.errors += 1;
                }
            }
        }

        count.committed = commit_logged(tx, "add_words").await;
        if count.committed {
            stage.apply();
        }
        count.finished_at = Utc::now();
        info!(
            total = count.total,
            duplicates = count.duplicates,
            unverified = count.unverified,
            errors = count.errors,
            new_end_nodes = count.new_end_nodes,
            new_attack_nodes = count.new_attack_nodes,
            "Word addition finished"
        );
        Ok(count)
    }

    /// Length check plus optional online lookup. `Ok(false)` means confirmed absent.
    async fn screen_word(&self, word: &str, verifier: Option<&dyn WordVerifier>) -> Result<bool> {
        let len = word.chars().count();
        if len < MIN_WORD_LENGTH {
            return Err(ValidationError::TooShort {
                word: word.to_string(),
                len,
                min: MIN_WORD_LENGTH,
            }
            .into());
        }
        match verifier {
            Some(verifier) => Ok(verify_word(verifier, word, self.retry).await?),
            None => Ok(true),
        }
    }

    /// Delete `words`. Absent words are counted as missing, not as errors.
    pub async fn batch_remove_words<S: AsRef<str> + Sync>(
        &self,
        words: &[S],
        cancel: &CancelToken,
    ) -> Result<WordCount> {
        let mut count = WordCount::start();
        info!(words = words.len(), "Word removal started");

        let mut tx = self.store.begin().await?;
        for raw in words {
            if cancel.is_cancelled() {
                count.cancelled = true;
                warn!("Word removal cancelled");
                break;
            }
            let word = raw.as_ref().trim();
            if word.is_empty() {
                continue;
            }
            match tx.delete_word(word).await {
                Ok(0) => count.missing += 1,
                Ok(n) => count.total += n as usize,
                Err(e) => {
                    warn!(word, error = %e, "Failed to remove word");
                    count.errors += 1;
                }
            }
        }

        count.committed = commit_logged(tx, "remove_words").await;
        count.finished_at = Utc::now();
        info!(total = count.total, missing = count.missing, errors = count.errors, "Word removal finished");
        Ok(count)
    }

    /// Register every node in every requested category.
    pub async fn batch_add_nodes<S: AsRef<str> + Sync>(
        &self,
        nodes: &[S],
        categories: NodeCategories,
        cancel: &CancelToken,
    ) -> Result<NodeCount> {
        self.node_job(nodes, categories, cancel, NodeJob::Add).await
    }

    /// Deregister every node from every requested category.
    pub async fn batch_remove_nodes<S: AsRef<str> + Sync>(
        &self,
        nodes: &[S],
        categories: NodeCategories,
        cancel: &CancelToken,
    ) -> Result<NodeCount> {
        self.node_job(nodes, categories, cancel, NodeJob::Remove).await
    }

    async fn node_job<S: AsRef<str> + Sync>(
        &self,
        nodes: &[S],
        categories: NodeCategories,
        cancel: &CancelToken,
        job: NodeJob,
    ) -> Result<NodeCount> {
        let mut count = NodeCount::start();
        info!(nodes = nodes.len(), categories = categories.bits(), ?job, "Node batch started");

        let mut tx = self.store.begin().await?;
        let mut stage = self.index.stage();
        'nodes: for raw in nodes {
            let node = raw.as_ref().trim();
            if node.is_empty() {
                continue;
            }
            for category in categories.iter() {
                if cancel.is_cancelled() {
                    count.cancelled = true;
                    warn!(?job, "Node batch cancelled");
                    break 'nodes;
                }
                if let Err(e) = category.validate(node) {
                    warn!(node, %category, error = %e, "Node rejected");
                    count.errors += 1;
                    continue;
                }
                let changed = match job {
                    NodeJob::Add => stage
                        .register(tx.as_mut(), node, category)
                        .await
                        .map(usize::from),
                    NodeJob::Remove => stage
                        .deregister(tx.as_mut(), node, category)
                        .await
                        .map(|n| n as usize),
                };
                match changed {
                    Ok(0) if job == NodeJob::Add => count.duplicates += 1,
                    Ok(0) => count.missing += 1,
                    Ok(n) => {
                        count.total += n;
                        count.per_category.add(category, n);
                    }
                    Err(e) => {
                        warn!(node, %category, error = %e, "Node store operation failed");
                        count.errors += 1;
                    }
                }
            }
        }

        count.committed = commit_logged(tx, job.name()).await;
        if count.committed {
            stage.apply();
        }
        count.finished_at = Utc::now();
        info!(?job, total = count.total, errors = count.errors, "Node batch finished");
        Ok(count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeJob {
    Add,
    Remove,
}

impl NodeJob {
    fn name(self) -> &'static str {
        match self {
            NodeJob::Add => "add_nodes",
            NodeJob::Remove => "remove_nodes",
        }
    }
}
