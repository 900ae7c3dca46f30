//! Test Fixtures
//!
//! Provides shared helpers for creating test databases and dictionaries.

use std::sync::Arc;

use tempfile::TempDir;

use crate::core::batch::CancelToken;
use crate::core::flags::WordFlags;
use crate::core::node::{NodeCategories, NodeCategory};
use crate::core::Dictionary;
use crate::database::Database;

// =============================================================================
// Database Fixtures
// =============================================================================

/// Create a test database in a temporary directory.
/// Returns both the database and the TempDir (which must be kept alive).
pub async fn create_test_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let db = Database::new(temp_dir.path())
        .await
        .expect("Failed to create test database");
    (db, temp_dir)
}

/// Create a dictionary over a fresh test database.
/// The database handle is returned too, for direct store assertions.
pub async fn create_test_dictionary() -> (Dictionary, Arc<Database>, TempDir) {
    let (db, temp_dir) = create_test_db().await;
    let db = Arc::new(db);
    let dictionary = Dictionary::open(db.clone())
        .await
        .expect("Failed to open dictionary");
    (dictionary, db, temp_dir)
}

// =============================================================================
// Word Fixtures
// =============================================================================

/// Plain words chaining through 가/나/다.
pub const PLAIN_WORDS: [&str; 6] = ["가나", "나다", "다라", "가방", "가나다라", "나라"];

/// Add `words` with no flags and assert the batch committed.
pub async fn seed_words(dictionary: &Dictionary, words: &[&str]) {
    let count = dictionary
        .batch_add_words(words, WordFlags::NONE, false, &CancelToken::new())
        .await
        .expect("Failed to seed words");
    assert!(count.committed, "seed batch did not commit");
}

/// Register `nodes` in `category` and assert the batch committed.
pub async fn seed_nodes(dictionary: &Dictionary, nodes: &[&str], category: NodeCategory) {
    let count = dictionary
        .batch_add_nodes(nodes, NodeCategories::empty().with(category), &CancelToken::new())
        .await
        .expect("Failed to seed nodes");
    assert!(count.committed, "seed batch did not commit");
}
