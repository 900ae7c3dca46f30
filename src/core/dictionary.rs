//! Dictionary Engine
//!
//! `Dictionary` ties the store, the node index cache and the optional online
//! verifier together. Batch jobs live in `batch`, candidate resolution in
//! `resolver`, integrity checking in `integrity`.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::core::error::{Result, ValidationError};
use crate::core::node::{GameMode, NodeCategory};
use crate::core::node_index::NodeIndex;
use crate::core::verify::{RetryPolicy, WordVerifier};
use crate::database::Store;

/// Default cap on candidates fetched per category.
pub const DEFAULT_MAX_CANDIDATES: u32 = 128;

/// Target classification for [`Dictionary::mark_node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeMark {
    End,
    Attack,
    Normal,
}

/// Word total and node set sizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DictionaryStats {
    pub words: i64,
    pub nodes: Vec<(NodeCategory, usize)>,
}

/// The dictionary engine.
pub struct Dictionary {
    pub(crate) store: Arc<dyn Store>,
    pub(crate) index: NodeIndex,
    pub(crate) verifier: Option<Arc<dyn WordVerifier>>,
    pub(crate) retry: RetryPolicy,
    pub(crate) max_candidates: u32,
}

impl Dictionary {
    /// Open the engine over `store`, loading the node index.
    pub async fn open(store: Arc<dyn Store>) -> Result<Self> {
        let index = NodeIndex::load(store.as_ref()).await?;
        Ok(Self {
            store,
            index,
            verifier: None,
            retry: RetryPolicy::default(),
            max_candidates: DEFAULT_MAX_CANDIDATES,
        })
    }

    pub fn with_verifier(mut self, verifier: Arc<dyn WordVerifier>, retry: RetryPolicy) -> Self {
        self.verifier = Some(verifier);
        self.retry = retry;
        self
    }

    pub fn with_max_candidates(mut self, max: u32) -> Self {
        self.max_candidates = max.max(1);
        self
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub fn node_index(&self) -> &NodeIndex {
        &self.index
    }

    /// Reload the node index from the store.
    pub async fn refresh_nodes(&self) -> Result<()> {
        self.index.reload(self.store.as_ref()).await?;
        Ok(())
    }

    /// Move the tail node of `word` between the end and attack sets of `mode`.
    ///
    /// Word flags are not rewritten here; `check_integrity` recomputes them.
    pub async fn mark_node(&self, word: &str, mode: GameMode, mark: NodeMark) -> Result<bool> {
        let node = mode
            .tail(word.trim())?
            .ok_or_else(|| ValidationError::UndefinedNode {
                word: word.to_string(),
                mode: mode.to_string(),
            })?;
        let end = mode.end_category();
        let attack = mode.attack_category();

        let mut tx = self.store.begin().await?;
        let mut stage = self.index.stage();
        let changed = match mark {
            NodeMark::End => {
                let removed = stage.deregister(tx.as_mut(), &node, attack).await?;
                stage.register(tx.as_mut(), &node, end).await? || removed > 0
            }
            NodeMark::Attack => {
                let removed = stage.deregister(tx.as_mut(), &node, end).await?;
                stage.register(tx.as_mut(), &node, attack).await? || removed > 0
            }
            NodeMark::Normal => {
                let removed_end = stage.deregister(tx.as_mut(), &node, end).await?;
                let removed_attack = stage.deregister(tx.as_mut(), &node, attack).await?;
                removed_end + removed_attack > 0
            }
        };
        tx.commit().await?;
        stage.apply();

        info!(word, node, %mode, ?mark, changed, "Node re-marked");
        Ok(changed)
    }

    pub async fn stats(&self) -> Result<DictionaryStats> {
        Ok(DictionaryStats {
            words: self.store.word_count().await?,
            nodes: NodeCategory::ALL
                .into_iter()
                .map(|c| (c, self.index.len(c)))
                .collect(),
        })
    }
}
