//! Dictionary Integrity Check
//!
//! Full scan of the word table: drops duplicates and unplayable words,
//! optionally drops words the online dictionary no longer knows, removes end
//! nodes that some word can still follow, and rewrites head columns and flags
//! that drifted from the node index.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::batch::{CancelToken, MIN_WORD_LENGTH};
use crate::core::dictionary::Dictionary;
use crate::core::error::{Result, VerifyError};
use crate::core::node::{NodeCategory, NodeRole};
use crate::core::verify::verify_word;
use crate::database::{WordEntry, WordRecord};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    /// Words scanned.
    pub total: usize,
    pub deduplicated: u64,
    pub removed: usize,
    pub fixed: usize,
    /// End nodes dropped because a stored word starts from them.
    pub invalid_end_nodes: usize,
    pub errors: usize,
    pub cancelled: bool,
}

impl Dictionary {
    pub async fn check_integrity(&self, verify_online: bool, cancel: &CancelToken) -> Result<IntegrityReport> {
        let verifier = if verify_online {
            Some(self.verifier.as_deref().ok_or(VerifyError::Unavailable)?)
        } else {
            None
        };
        let mut report = IntegrityReport {
            deduplicated: self.store.deduplicate().await?,
            ..IntegrityReport::default()
        };
        self.refresh_nodes().await?;

        let words = self.store.list_words().await?;
        report.total = words.len();
        info!(words = report.total, verify_online, "Integrity check started");

        let mut removals: Vec<String> = Vec::new();
        let mut kept: Vec<WordRecord> = Vec::with_capacity(words.len());
        for record in words {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            if record.char_len() < MIN_WORD_LENGTH {
                removals.push(record.word);
                continue;
            }
            if let Some(verifier) = verifier {
                match verify_word(verifier, &record.word, self.retry).await {
                    Ok(false) => {
                        removals.push(record.word);
                        continue;
                    }
                    Ok(true) => {}
                    Err(e) => {
                        warn!(word = %record.word, error = %e, "Could not verify word, keeping it");
                        report.errors += 1;
                    }
                }
            }
            kept.push(record);
        }

        if report.cancelled {
            warn!("Integrity check cancelled before writing");
            return Ok(report);
        }

        let mut tx = self.store.begin().await?;
        for word in &removals {
            match tx.delete_word(word).await {
                Ok(n) => report.removed += n as usize,
                Err(e) => {
                    warn!(word, error = %e, "Failed to remove invalid word");
                    report.errors += 1;
                }
            }
        }

        let mut stage = self.index.stage();
        for category in NodeCategory::ALL {
            if category.role() != NodeRole::End {
                continue;
            }
            for node in invalid_end_nodes(&kept, category, self.index.nodes(category)) {
                match stage.deregister(tx.as_mut(), &node, category).await {
                    Ok(n) => report.invalid_end_nodes += n as usize,
                    Err(e) => {
                        warn!(node, %category, error = %e, "Failed to remove invalid end node");
                        report.errors += 1;
                    }
                }
            }
        }

        for record in &kept {
            let entry = match stage
                .compute_flags(&record.word)
                .and_then(|flags| WordEntry::derive(&record.word, flags))
            {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(word = %record.word, error = %e, "Cannot derive nodes");
                    report.errors += 1;
                    continue;
                }
            };
            if !entry.differs_from(record) {
                continue;
            }
            match tx.update_word(&entry).await {
                Ok(n) => report.fixed += n as usize,
                Err(e) => {
                    warn!(word = %record.word, error = %e, "Failed to repair word");
                    report.errors += 1;
                }
            }
        }
        tx.commit().await?;
        stage.apply();

        self.store.vacuum().await?;
        info!(?report, "Integrity check finished");
        Ok(report)
    }
}

/// Nodes of the end `category` that some word in `words` can be played from.
fn invalid_end_nodes(words: &[WordRecord], category: NodeCategory, nodes: Vec<String>) -> Vec<String> {
    let mode = category.mode();
    let heads: HashSet<String> = words
        .iter()
        .filter_map(|record| mode.head(&record.word).ok().flatten())
        .collect();
    nodes
        .into_iter()
        .filter(|node| {
            let invalid = heads.contains(node);
            if invalid {
                debug!(node, %category, "End node has a successor");
            }
            invalid
        })
        .collect()
}
