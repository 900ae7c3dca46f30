//! Node Index Cache
//!
//! In-memory membership sets for the eight node categories. Mutations go
//! through a [`NodeStage`]: each one is written to the caller's store
//! transaction and recorded in the stage, and the stage is applied to the
//! index only after that transaction commits. A dropped stage leaves the
//! index untouched.
//!
//! Entries are never dropped when the last word ending in a node is deleted.
//! A stale entry only costs the resolver one empty lookup.

use std::collections::HashSet;
use std::sync::RwLock;

use tracing::{debug, info};

use crate::core::error::{StoreResult, ValidationError};
use crate::core::flags::WordFlags;
use crate::core::node::{NodeCategory, NodeRole};
use crate::database::{Store, StoreTransaction};

/// Nodes registered while widening one word's flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NewNodes {
    pub end: usize,
    pub attack: usize,
}

/// Per-category node membership sets.
#[derive(Debug, Default)]
pub struct NodeIndex {
    sets: RwLock<[HashSet<String>; 8]>,
}

impl NodeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from the store's node tables.
    pub async fn load(store: &dyn Store) -> StoreResult<Self> {
        let index = Self::new();
        index.reload(store).await?;
        Ok(index)
    }

    /// Replace every set with the store's current contents.
    pub async fn reload(&self, store: &dyn Store) -> StoreResult<()> {
        let mut fresh: [HashSet<String>; 8] = Default::default();
        for category in NodeCategory::ALL {
            fresh[category.index()] = store.list_nodes(category).await?.into_iter().collect();
        }
        let sizes: Vec<usize> = fresh.iter().map(HashSet::len).collect();
        *self.write() = fresh;
        info!(?sizes, "Node index loaded");
        Ok(())
    }

    pub fn contains(&self, node: &str, category: NodeCategory) -> bool {
        self.read()[category.index()].contains(node)
    }

    pub fn len(&self, category: NodeCategory) -> usize {
        self.read()[category.index()].len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().iter().all(HashSet::is_empty)
    }

    /// Sorted snapshot of one category.
    pub fn nodes(&self, category: NodeCategory) -> Vec<String> {
        let mut nodes: Vec<String> = self.read()[category.index()].iter().cloned().collect();
        nodes.sort();
        nodes
    }

    /// Start staging node changes against this index.
    pub fn stage(&self) -> NodeStage<'_> {
        NodeStage {
            index: self,
            added: Default::default(),
            removed: Default::default(),
        }
    }

    /// Flags implied by the nodes already in the index. Registers nothing.
    pub fn compute_flags(&self, word: &str) -> Result<WordFlags, ValidationError> {
        flags_from(word, |node, category| self.contains(node, category))
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, [HashSet<String>; 8]> {
        self.sets.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, [HashSet<String>; 8]> {
        self.sets.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn flags_from(
    word: &str,
    contains: impl Fn(&str, NodeCategory) -> bool,
) -> Result<WordFlags, ValidationError> {
    let mut flags = WordFlags::NONE;
    for category in NodeCategory::ALL {
        if let Some(node) = category.mode().tail(word)? {
            if contains(node.as_str(), category) {
                flags |= category.flag();
            }
        }
    }
    Ok(flags)
}

// ============================================================================
// Staged Changes
// ============================================================================

/// Node changes written to an open transaction but not yet committed.
///
/// Lookups see the index with the pending changes laid over it, so later items
/// of the same batch observe nodes registered by earlier ones.
#[derive(Debug)]
pub struct NodeStage<'a> {
    index: &'a NodeIndex,
    added: [HashSet<String>; 8],
    removed: [HashSet<String>; 8],
}

impl NodeStage<'_> {
    pub fn contains(&self, node: &str, category: NodeCategory) -> bool {
        let i = category.index();
        if self.removed[i].contains(node) {
            return false;
        }
        self.added[i].contains(node) || self.index.contains(node, category)
    }

    /// Flags implied by the index with the staged changes applied.
    pub fn compute_flags(&self, word: &str) -> Result<WordFlags, ValidationError> {
        flags_from(word, |node, category| self.contains(node, category))
    }

    pub fn is_empty(&self) -> bool {
        self.added.iter().chain(self.removed.iter()).all(HashSet::is_empty)
    }

    /// Add `node` to `category`. Returns true only for a new membership.
    pub async fn register(
        &mut self,
        tx: &mut dyn StoreTransaction,
        node: &str,
        category: NodeCategory,
    ) -> StoreResult<bool> {
        if self.contains(node, category) {
            return Ok(false);
        }
        let inserted = tx.add_node(category, node).await?;
        let i = category.index();
        self.removed[i].remove(node);
        self.added[i].insert(node.to_string());
        debug!(node, %category, inserted, "Staged node registration");
        Ok(inserted)
    }

    /// Remove `node` from `category`. Returns 1 if it was present, 0 otherwise.
    pub async fn deregister(
        &mut self,
        tx: &mut dyn StoreTransaction,
        node: &str,
        category: NodeCategory,
    ) -> StoreResult<u64> {
        let removed = tx.delete_node(category, node).await?;
        let i = category.index();
        self.added[i].remove(node);
        self.removed[i].insert(node.to_string());
        debug!(node, %category, removed, "Staged node removal");
        Ok(removed.min(1))
    }

    /// Widen `floor` with every category the word's tail nodes already belong
    /// to, and register the tail node of every category `floor` claims but the
    /// index does not know yet.
    pub async fn widen_flags(
        &mut self,
        tx: &mut dyn StoreTransaction,
        word: &str,
        floor: WordFlags,
    ) -> crate::core::error::Result<(WordFlags, NewNodes)> {
        let mut flags = floor;
        let mut new_nodes = NewNodes::default();

        for category in NodeCategory::ALL {
            let Some(node) = category.mode().tail(word)? else {
                continue;
            };
            if self.contains(&node, category) {
                flags |= category.flag();
            } else if floor.contains(category.flag()) && self.register(tx, &node, category).await? {
                match category.role() {
                    NodeRole::End => new_nodes.end += 1,
                    NodeRole::Attack => new_nodes.attack += 1,
                }
            }
        }

        Ok((flags, new_nodes))
    }

    /// Fold the staged changes into the index. Call only after the
    /// transaction they were written to has committed.
    pub fn apply(self) {
        if self.is_empty() {
            return;
        }
        let mut sets = self.index.write();
        for (i, (added, removed)) in self.added.into_iter().zip(self.removed).enumerate() {
            for node in &removed {
                sets[i].remove(node);
            }
            sets[i].extend(added);
        }
        debug!("Staged node changes applied");
    }
}
