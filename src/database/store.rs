//! Store capability interface
//!
//! Engine-neutral traits the dictionary engine is written against, and their
//! SQLite implementation on [`Database`].

use async_trait::async_trait;
use tokio::sync::OwnedMutexGuard;

use super::{Database, NodeOps, SchemaOps, WordEntry, WordOps, WordQuery, WordRecord};
use crate::core::error::{StoreError, StoreResult};
use crate::core::node::NodeCategory;

// ============================================================================
// Traits
// ============================================================================

/// Durable word and node storage.
#[async_trait]
pub trait Store: Send + Sync {
    /// Start a write transaction. Only one may be open at a time.
    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>>;

    async fn list_nodes(&self, category: NodeCategory) -> StoreResult<Vec<String>>;
    async fn find_words(&self, query: &WordQuery) -> StoreResult<Vec<WordRecord>>;
    async fn get_word(&self, word: &str) -> StoreResult<Option<WordRecord>>;
    async fn list_words(&self) -> StoreResult<Vec<WordRecord>>;
    async fn word_count(&self) -> StoreResult<i64>;

    /// Remove duplicate word rows, returning how many were dropped.
    async fn deduplicate(&self) -> StoreResult<u64>;
    async fn vacuum(&self) -> StoreResult<()>;

    async fn table_exists(&self, table: &str) -> StoreResult<bool>;
    async fn column_exists(&self, table: &str, column: &str) -> StoreResult<bool>;
    async fn column_type(&self, table: &str, column: &str) -> StoreResult<Option<String>>;
}

/// Open write transaction. Dropping it without `commit` rolls back.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Insert a node; false if it was already present.
    async fn add_node(&mut self, category: NodeCategory, node: &str) -> StoreResult<bool>;
    /// Delete a node; number of rows removed.
    async fn delete_node(&mut self, category: NodeCategory, node: &str) -> StoreResult<u64>;
    /// Insert a word; false if the word already exists.
    async fn add_word(&mut self, entry: &WordEntry) -> StoreResult<bool>;
    /// Rewrite the derived columns and flags of an existing word.
    async fn update_word(&mut self, entry: &WordEntry) -> StoreResult<u64>;
    async fn delete_word(&mut self, word: &str) -> StoreResult<u64>;
    async fn commit(self: Box<Self>) -> StoreResult<()>;
}

// ============================================================================
// SQLite Transaction
// ============================================================================

/// SQLite write transaction holding the database's writer gate.
pub struct SqliteTransaction {
    tx: sqlx::Transaction<'static, sqlx::Sqlite>,
    _gate: OwnedMutexGuard<()>,
}

impl SqliteTransaction {
    pub(crate) fn new(tx: sqlx::Transaction<'static, sqlx::Sqlite>, gate: OwnedMutexGuard<()>) -> Self {
        Self { tx, _gate: gate }
    }
}

#[async_trait]
impl StoreTransaction for SqliteTransaction {
    async fn add_node(&mut self, category: NodeCategory, node: &str) -> StoreResult<bool> {
        let table = category.table_name();
        let result = sqlx::query(&format!(
            "INSERT INTO {table} (word_index) SELECT ? WHERE NOT EXISTS (SELECT 1 FROM {table} WHERE word_index = ?)"
        ))
        .bind(node)
        .bind(node)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_node(&mut self, category: NodeCategory, node: &str) -> StoreResult<u64> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE word_index = ?", category.table_name()))
            .bind(node)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn add_word(&mut self, entry: &WordEntry) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO word_list (word, word_index, reverse_word_index, kkutu_index, flags)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(word) DO NOTHING
            "#,
        )
        .bind(&entry.word)
        .bind(&entry.word_index)
        .bind(&entry.reverse_word_index)
        .bind(&entry.kkutu_index)
        .bind(i64::from(entry.flags))
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_word(&mut self, entry: &WordEntry) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE word_list
            SET word_index = ?, reverse_word_index = ?, kkutu_index = ?, flags = ?
            WHERE word = ?
            "#,
        )
        .bind(&entry.word_index)
        .bind(&entry.reverse_word_index)
        .bind(&entry.kkutu_index)
        .bind(i64::from(entry.flags))
        .bind(&entry.word)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete_word(&mut self, word: &str) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM word_list WHERE word = ?")
            .bind(word)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| StoreError::transaction(format!("commit failed: {e}")))
    }
}

// ============================================================================
// SQLite Store
// ============================================================================

#[async_trait]
impl Store for Database {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>> {
        let tx = self
            .begin_write()
            .await
            .map_err(|e| StoreError::transaction(format!("begin failed: {e}")))?;
        Ok(Box::new(tx))
    }

    async fn list_nodes(&self, category: NodeCategory) -> StoreResult<Vec<String>> {
        Ok(NodeOps::list_nodes(self, category).await?)
    }

    async fn find_words(&self, query: &WordQuery) -> StoreResult<Vec<WordRecord>> {
        Ok(WordOps::find_words(self, query).await?)
    }

    async fn get_word(&self, word: &str) -> StoreResult<Option<WordRecord>> {
        Ok(WordOps::get_word(self, word).await?)
    }

    async fn list_words(&self) -> StoreResult<Vec<WordRecord>> {
        Ok(WordOps::list_words(self).await?)
    }

    async fn word_count(&self) -> StoreResult<i64> {
        Ok(WordOps::word_count(self).await?)
    }

    async fn deduplicate(&self) -> StoreResult<u64> {
        Ok(self.deduplicate_words().await?)
    }

    async fn vacuum(&self) -> StoreResult<()> {
        Ok(Database::vacuum(self).await?)
    }

    async fn table_exists(&self, table: &str) -> StoreResult<bool> {
        Ok(SchemaOps::table_exists(self, table).await?)
    }

    async fn column_exists(&self, table: &str, column: &str) -> StoreResult<bool> {
        Ok(SchemaOps::column_exists(self, table, column).await?)
    }

    async fn column_type(&self, table: &str, column: &str) -> StoreResult<Option<String>> {
        Ok(SchemaOps::column_type(self, table, column).await?)
    }
}
