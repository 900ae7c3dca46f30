//! Schema introspection and legacy upgrade
//!
//! Older dictionaries predate the reverse and long head columns, stored a
//! single `is_endword` boolean instead of flags, and had no `seq` column.
//! `upgrade_legacy_schema` detects each of those shapes and fixes it in place.

use super::migrations::{WORD_TABLE_COLUMNS, WORD_TABLE_INDEXES};
use super::Database;
use sqlx::Row;
use tracing::info;

/// Extension trait for schema introspection
pub trait SchemaOps {
    fn table_exists(&self, table: &str) -> impl std::future::Future<Output = Result<bool, sqlx::Error>> + Send;
    fn column_exists(&self, table: &str, column: &str) -> impl std::future::Future<Output = Result<bool, sqlx::Error>> + Send;
    fn column_type(&self, table: &str, column: &str) -> impl std::future::Future<Output = Result<Option<String>, sqlx::Error>> + Send;
}

impl SchemaOps for Database {
    async fn table_exists(&self, table: &str) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(table)
            .fetch_one(self.pool())
            .await?;
        Ok(row.try_get::<i64, _>("count")? > 0)
    }

    async fn column_exists(&self, table: &str, column: &str) -> Result<bool, sqlx::Error> {
        Ok(self.column_type(table, column).await?.is_some())
    }

    /// Declared type of the column, upper-cased, or `None` if it does not exist.
    async fn column_type(&self, table: &str, column: &str) -> Result<Option<String>, sqlx::Error> {
        let row = sqlx::query("SELECT type FROM pragma_table_info(?) WHERE name = ?")
            .bind(table)
            .bind(column)
            .fetch_optional(self.pool())
            .await?;

        row.map(|r| r.try_get::<String, _>("type").map(|t| t.to_uppercase()))
            .transpose()
    }
}

async fn execute(db: &Database, sql: &str) -> Result<(), sqlx::Error> {
    sqlx::query(sql).execute(db.pool()).await?;
    Ok(())
}

/// Bring a legacy `word_list` up to the current shape. Returns true if anything changed.
pub async fn upgrade_legacy_schema(db: &Database) -> Result<bool, sqlx::Error> {
    if !db.table_exists("word_list").await? {
        return Ok(false);
    }

    let _gate = db.write_gate().lock().await;
    let mut changed = false;

    if !db.column_exists("word_list", "reverse_word_index").await? {
        info!("Adding reverse_word_index to legacy word table");
        execute(db, "ALTER TABLE word_list ADD COLUMN reverse_word_index CHAR(1) NOT NULL DEFAULT ''").await?;
        execute(db, "UPDATE word_list SET reverse_word_index = substr(word, -1, 1)").await?;
        changed = true;
    }

    if !db.column_exists("word_list", "kkutu_index").await? {
        info!("Adding kkutu_index to legacy word table");
        execute(db, "ALTER TABLE word_list ADD COLUMN kkutu_index VARCHAR(2) NOT NULL DEFAULT ''").await?;
        execute(
            db,
            r#"UPDATE word_list SET kkutu_index = CASE
                WHEN length(word) >= 4 THEN substr(word, 1, 2)
                WHEN length(word) = 3 THEN substr(word, 1, 1)
                ELSE '' END"#,
        )
        .await?;
        changed = true;
    }

    let has_is_endword = db.column_exists("word_list", "is_endword").await?;
    if !db.column_exists("word_list", "flags").await? {
        info!("Adding flags to legacy word table");
        execute(db, "ALTER TABLE word_list ADD COLUMN flags SMALLINT NOT NULL DEFAULT 0").await?;
        if has_is_endword {
            execute(db, "UPDATE word_list SET flags = CASE WHEN is_endword != 0 THEN 1 ELSE 0 END").await?;
        }
        changed = true;
    }

    let kkutu_type = db.column_type("word_list", "kkutu_index").await?;
    let needs_rebuild = !db.column_exists("word_list", "seq").await?
        || has_is_endword
        || kkutu_type.as_deref() != Some("VARCHAR(2)");

    if needs_rebuild {
        info!(?kkutu_type, has_is_endword, "Rebuilding legacy word table");
        rebuild_word_table(db).await?;
        changed = true;
    }

    Ok(changed)
}

async fn rebuild_word_table(db: &Database) -> Result<(), sqlx::Error> {
    let mut tx = db.pool().begin().await?;

    sqlx::query("DROP TABLE IF EXISTS word_list_rebuild")
        .execute(&mut *tx)
        .await?;
    sqlx::query(&format!("CREATE TABLE word_list_rebuild ({WORD_TABLE_COLUMNS})"))
        .execute(&mut *tx)
        .await?;
    sqlx::query(
        r#"INSERT OR IGNORE INTO word_list_rebuild (word, word_index, reverse_word_index, kkutu_index, flags)
           SELECT word, word_index, reverse_word_index, kkutu_index, flags FROM word_list ORDER BY rowid"#,
    )
    .execute(&mut *tx)
    .await?;
    sqlx::query("DROP TABLE word_list").execute(&mut *tx).await?;
    sqlx::query("ALTER TABLE word_list_rebuild RENAME TO word_list")
        .execute(&mut *tx)
        .await?;
    for statement in WORD_TABLE_INDEXES.split(';').filter(|s| !s.trim().is_empty()) {
        sqlx::query(statement.trim()).execute(&mut *tx).await?;
    }

    tx.commit().await
}
