//! Schema Tests
//!
//! Migration bookkeeping and the in-place upgrade of legacy dictionaries.

use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use tempfile::TempDir;

use crate::core::flags::WordFlags;
use crate::database::{Database, SchemaOps, WordOps, DEFAULT_DB_FILE};
use crate::tests::common::create_test_db;

// =============================================================================
// Fresh Database
// =============================================================================

#[tokio::test]
async fn test_fresh_schema_shape() {
    let (db, _temp) = create_test_db().await;

    assert!(db.table_exists("word_list").await.unwrap());
    assert!(!db.table_exists("no_such_table").await.unwrap());
    assert!(db.column_exists("word_list", "seq").await.unwrap());
    assert!(!db.column_exists("word_list", "is_endword").await.unwrap());
    assert_eq!(
        db.column_type("word_list", "kkutu_index").await.unwrap().as_deref(),
        Some("VARCHAR(2)")
    );
    assert_eq!(db.column_type("word_list", "missing").await.unwrap(), None);

    let row = sqlx::query("SELECT MAX(version) as version FROM _migrations")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(row.get::<i32, _>("version"), 2);
}

#[tokio::test]
async fn test_reopen_is_idempotent() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    {
        let db = Database::new(temp_dir.path()).await.unwrap();
        db.pool().close().await;
    }
    let db = Database::new(temp_dir.path()).await.expect("Failed to reopen");
    assert_eq!(db.word_count().await.unwrap(), 0);
}

// =============================================================================
// Legacy Upgrade
// =============================================================================

async fn create_legacy_db(dir: &TempDir) {
    let path = dir.path().join(DEFAULT_DB_FILE);
    let pool = SqlitePool::connect(&format!("sqlite:{}?mode=rwc", path.display()))
        .await
        .expect("Failed to create legacy database");

    for sql in [
        "CREATE TABLE word_list (word VARCHAR(256) NOT NULL, word_index CHAR(1) NOT NULL, is_endword INTEGER NOT NULL DEFAULT 0)",
        "CREATE TABLE endword_list (word_index CHAR(1) NOT NULL PRIMARY KEY)",
        "INSERT INTO word_list (word, word_index, is_endword) VALUES ('사과', '사', 1)",
        "INSERT INTO word_list (word, word_index, is_endword) VALUES ('사과', '사', 1)",
        "INSERT INTO word_list (word, word_index, is_endword) VALUES ('가나다라', '가', 0)",
        "INSERT INTO endword_list (word_index) VALUES ('과')",
    ] {
        sqlx::query(sql).execute(&pool).await.expect("Failed to seed legacy table");
    }
    pool.close().await;
}

#[tokio::test]
async fn test_legacy_table_is_upgraded() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    create_legacy_db(&temp_dir).await;

    let db = Database::new(temp_dir.path()).await.expect("Failed to open legacy database");

    assert!(db.column_exists("word_list", "seq").await.unwrap());
    assert!(db.column_exists("word_list", "flags").await.unwrap());
    assert!(!db.column_exists("word_list", "is_endword").await.unwrap());
    assert!(db.table_exists("middle_endword_list").await.unwrap());

    // Duplicates collapse during the rebuild.
    assert_eq!(db.word_count().await.unwrap(), 2);

    let apple = db.get_word("사과").await.unwrap().expect("사과 lost in upgrade");
    assert_eq!(apple.word_flags(), WordFlags::END_WORD);
    assert_eq!(apple.reverse_word_index, "과");
    assert_eq!(apple.kkutu_index, "");

    let long = db.get_word("가나다라").await.unwrap().unwrap();
    assert_eq!(long.word_flags(), WordFlags::NONE);
    assert_eq!(long.reverse_word_index, "라");
    assert_eq!(long.kkutu_index, "가나");
}
