//! Mock implementations for testing
//!
//! `FlakyStore` wraps a real SQLite store and injects failures for chosen
//! words or nodes, so fault isolation can be tested against real tables.
//! Verifier doubles come from the `MockWordVerifier` generated by mockall.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::core::error::{StoreError, StoreResult};
use crate::core::node::NodeCategory;
use crate::core::verify::{MockWordVerifier, Verdict};
use crate::database::{Database, Store, StoreTransaction, WordEntry, WordQuery, WordRecord};

// ============================================================================
// Fault-injecting Store
// ============================================================================

#[derive(Debug, Default)]
struct Faults {
    words: HashSet<String>,
    nodes: HashSet<String>,
    fail_commit: AtomicBool,
    fail_reads: AtomicBool,
}

/// Store that fails writes for configured words and nodes.
#[derive(Clone)]
pub struct FlakyStore {
    inner: Arc<Database>,
    faults: Arc<Faults>,
}

impl FlakyStore {
    pub fn new(inner: Arc<Database>) -> Self {
        Self {
            inner,
            faults: Arc::new(Faults::default()),
        }
    }

    pub fn failing_words<I: IntoIterator<Item = &'static str>>(mut self, words: I) -> Self {
        self.faults_mut().words.extend(words.into_iter().map(String::from));
        self
    }

    pub fn failing_nodes<I: IntoIterator<Item = &'static str>>(mut self, nodes: I) -> Self {
        self.faults_mut().nodes.extend(nodes.into_iter().map(String::from));
        self
    }

    pub fn fail_commit(&self) {
        self.faults.fail_commit.store(true, Ordering::SeqCst);
    }

    pub fn restore_commit(&self) {
        self.faults.fail_commit.store(false, Ordering::SeqCst);
    }

    pub fn fail_reads(&self) {
        self.faults.fail_reads.store(true, Ordering::SeqCst);
    }

    fn faults_mut(&mut self) -> &mut Faults {
        Arc::get_mut(&mut self.faults).expect("faults must be configured before the store is cloned")
    }

    fn check_reads(&self) -> StoreResult<()> {
        if self.faults.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::backend("injected read failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for FlakyStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>> {
        Ok(Box::new(FlakyTransaction {
            inner: self.inner.begin().await?,
            faults: self.faults.clone(),
        }))
    }

    async fn list_nodes(&self, category: NodeCategory) -> StoreResult<Vec<String>> {
        self.inner.list_nodes(category).await
    }

    async fn find_words(&self, query: &WordQuery) -> StoreResult<Vec<WordRecord>> {
        self.check_reads()?;
        self.inner.find_words(query).await
    }

    async fn get_word(&self, word: &str) -> StoreResult<Option<WordRecord>> {
        self.check_reads()?;
        self.inner.get_word(word).await
    }

    async fn list_words(&self) -> StoreResult<Vec<WordRecord>> {
        self.inner.list_words().await
    }

    async fn word_count(&self) -> StoreResult<i64> {
        self.inner.word_count().await
    }

    async fn deduplicate(&self) -> StoreResult<u64> {
        self.inner.deduplicate().await
    }

    async fn vacuum(&self) -> StoreResult<()> {
        Store::vacuum(self.inner.as_ref()).await
    }

    async fn table_exists(&self, table: &str) -> StoreResult<bool> {
        self.inner.table_exists(table).await
    }

    async fn column_exists(&self, table: &str, column: &str) -> StoreResult<bool> {
        self.inner.column_exists(table, column).await
    }

    async fn column_type(&self, table: &str, column: &str) -> StoreResult<Option<String>> {
        self.inner.column_type(table, column).await
    }
}

struct FlakyTransaction {
    inner: Box<dyn StoreTransaction>,
    faults: Arc<Faults>,
}

impl FlakyTransaction {
    fn check_node(&self, node: &str) -> StoreResult<()> {
        if self.faults.nodes.contains(node) {
            return Err(StoreError::backend(format!("injected failure for node {node}")));
        }
        Ok(())
    }

    fn check_word(&self, word: &str) -> StoreResult<()> {
        if self.faults.words.contains(word) {
            return Err(StoreError::backend(format!("injected failure for word {word}")));
        }
        Ok(())
    }
}

#[async_trait]
impl StoreTransaction for FlakyTransaction {
    async fn add_node(&mut self, category: NodeCategory, node: &str) -> StoreResult<bool> {
        self.check_node(node)?;
        self.inner.add_node(category, node).await
    }

    async fn delete_node(&mut self, category: NodeCategory, node: &str) -> StoreResult<u64> {
        self.check_node(node)?;
        self.inner.delete_node(category, node).await
    }

    async fn add_word(&mut self, entry: &WordEntry) -> StoreResult<bool> {
        self.check_word(&entry.word)?;
        self.inner.add_word(entry).await
    }

    async fn update_word(&mut self, entry: &WordEntry) -> StoreResult<u64> {
        self.check_word(&entry.word)?;
        self.inner.update_word(entry).await
    }

    async fn delete_word(&mut self, word: &str) -> StoreResult<u64> {
        self.check_word(word)?;
        self.inner.delete_word(word).await
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        if self.faults.fail_commit.load(Ordering::SeqCst) {
            // Dropping the inner transaction rolls it back.
            return Err(StoreError::transaction("injected commit failure"));
        }
        self.inner.commit().await
    }
}

// ============================================================================
// Verifier Doubles
// ============================================================================

/// Verifier that knows exactly `known` and answers not-found for the rest.
pub fn verifier_knowing(known: &'static [&'static str]) -> MockWordVerifier {
    let mut mock = MockWordVerifier::new();
    mock.expect_lookup().returning(move |word| {
        Ok(if known.contains(&word) {
            Verdict::Found
        } else {
            Verdict::NotFound
        })
    });
    mock
}
