//! Word database operations
//!
//! Read-side queries on `word_list`. Writes go through `SqliteTransaction`.

use super::{Database, MissionFilter, WordQuery, WordRecord};
use sqlx::Row;

const WORD_COLUMNS: &str = "seq, word, word_index, reverse_word_index, kkutu_index, flags";

/// Extension trait for word database operations
pub trait WordOps {
    fn get_word(&self, word: &str) -> impl std::future::Future<Output = Result<Option<WordRecord>, sqlx::Error>> + Send;
    fn find_words(&self, query: &WordQuery) -> impl std::future::Future<Output = Result<Vec<WordRecord>, sqlx::Error>> + Send;
    fn list_words(&self) -> impl std::future::Future<Output = Result<Vec<WordRecord>, sqlx::Error>> + Send;
    fn word_count(&self) -> impl std::future::Future<Output = Result<i64, sqlx::Error>> + Send;
    fn deduplicate_words(&self) -> impl std::future::Future<Output = Result<u64, sqlx::Error>> + Send;
}

impl WordOps for Database {
    async fn get_word(&self, word: &str) -> Result<Option<WordRecord>, sqlx::Error> {
        sqlx::query_as::<_, WordRecord>(&format!("SELECT {WORD_COLUMNS} FROM word_list WHERE word = ?"))
            .bind(word)
            .fetch_optional(self.pool())
            .await
    }

    async fn find_words(&self, query: &WordQuery) -> Result<Vec<WordRecord>, sqlx::Error> {
        if query.nodes.is_empty() {
            return Ok(Vec::new());
        }

        let sql = build_find_sql(query);
        let mut q = sqlx::query_as::<_, WordRecord>(&sql);
        for node in &query.nodes {
            q = q.bind(node.as_str());
        }
        if !query.require.is_empty() {
            q = q.bind(i64::from(query.require));
        }
        if !query.forbid.is_empty() {
            q = q.bind(i64::from(query.forbid));
        }
        match query.mission {
            MissionFilter::Any => {}
            MissionFilter::Contains(c) | MissionFilter::Lacks(c) => {
                q = q.bind(c.to_string());
            }
        }
        if !query.exclude.is_empty() {
            let excluded = serde_json::to_string(&query.exclude)
                .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
            q = q.bind(excluded);
        }
        q.bind(i64::from(query.limit)).fetch_all(self.pool()).await
    }

    async fn list_words(&self) -> Result<Vec<WordRecord>, sqlx::Error> {
        sqlx::query_as::<_, WordRecord>(&format!("SELECT {WORD_COLUMNS} FROM word_list ORDER BY seq"))
            .fetch_all(self.pool())
            .await
    }

    async fn word_count(&self) -> Result<i64, sqlx::Error> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM word_list")
            .fetch_one(self.pool())
            .await?;
        row.try_get("count")
    }

    /// Keep the lowest `seq` of every duplicated word.
    async fn deduplicate_words(&self) -> Result<u64, sqlx::Error> {
        let _gate = self.write_gate().lock().await;
        let result = sqlx::query(
            "DELETE FROM word_list WHERE seq NOT IN (SELECT MIN(seq) FROM word_list GROUP BY word)",
        )
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected())
    }
}

fn build_find_sql(query: &WordQuery) -> String {
    let placeholders = vec!["?"; query.nodes.len()].join(", ");
    let mut sql = format!(
        "SELECT {WORD_COLUMNS} FROM word_list WHERE {} IN ({placeholders})",
        query.column.column_name()
    );
    if !query.require.is_empty() {
        sql.push_str(" AND (flags & ?) != 0");
    }
    if !query.forbid.is_empty() {
        sql.push_str(" AND (flags & ?) = 0");
    }
    match query.mission {
        MissionFilter::Any => {}
        MissionFilter::Contains(_) => sql.push_str(" AND instr(word, ?) > 0"),
        MissionFilter::Lacks(_) => sql.push_str(" AND instr(word, ?) = 0"),
    }
    if !query.exclude.is_empty() {
        sql.push_str(" AND word NOT IN (SELECT value FROM json_each(?))");
    }
    sql.push_str(" ORDER BY LENGTH(word) DESC, seq ASC LIMIT ?");
    sql
}
