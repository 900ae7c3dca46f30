//! Database Migrations
//!
//! Handles schema creation and versioned migrations.

use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use tracing::{info, warn};

/// Current database schema version
const SCHEMA_VERSION: i32 = 2;

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Create migrations table if it doesn't exist
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    let current_version = get_current_version(pool).await?;

    info!(current_version, target_version = SCHEMA_VERSION, "Checking database migrations");

    if current_version < SCHEMA_VERSION {
        info!("Running database migrations from v{} to v{}", current_version, SCHEMA_VERSION);

        for version in (current_version + 1)..=SCHEMA_VERSION {
            run_migration(pool, version).await?;
        }

        info!("Database migrations completed successfully");
    }

    Ok(())
}

/// Get the current schema version
async fn get_current_version(pool: &SqlitePool) -> Result<i32, sqlx::Error> {
    let result = sqlx::query("SELECT MAX(version) as version FROM _migrations")
        .fetch_optional(pool)
        .await?;

    Ok(result
        .and_then(|row| row.try_get::<i32, _>("version").ok())
        .unwrap_or(0))
}

/// Name and statements of a migration version
fn migration_sql(version: i32) -> Option<(&'static str, String)> {
    match version {
        1 => Some((
            "word_and_node_tables",
            format!(
                "CREATE TABLE IF NOT EXISTS word_list ({WORD_TABLE_COLUMNS});\n{WORD_TABLE_INDEXES};\n{MIGRATION_V1_NODE_TABLES}"
            ),
        )),
        2 => Some(("middle_node_tables", MIGRATION_V2.to_string())),
        _ => None,
    }
}

/// Run a specific migration version inside its own transaction
async fn run_migration(pool: &SqlitePool, version: i32) -> Result<(), sqlx::Error> {
    let Some((name, sql)) = migration_sql(version) else {
        warn!("Unknown migration version: {}", version);
        return Ok(());
    };

    info!("Applying migration v{}: {}", version, name);

    let mut tx = pool.begin().await?;
    for statement in sql.split(';').filter(|s| !s.trim().is_empty()) {
        sqlx::query(statement.trim()).execute(&mut *tx).await?;
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(version)
        .bind(name)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    Ok(())
}

/// Canonical word table definition, shared with the legacy table rebuild.
pub(crate) const WORD_TABLE_COLUMNS: &str = r#"
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    word VARCHAR(256) UNIQUE NOT NULL CHECK (length(word) <= 256),
    word_index CHAR(1) NOT NULL,
    reverse_word_index CHAR(1) NOT NULL,
    kkutu_index VARCHAR(2) NOT NULL,
    flags SMALLINT NOT NULL DEFAULT 0
"#;

/// Head-node indexes on the word table.
pub(crate) const WORD_TABLE_INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_word_list_word_index ON word_list(word_index);
CREATE INDEX IF NOT EXISTS idx_word_list_reverse_word_index ON word_list(reverse_word_index);
CREATE INDEX IF NOT EXISTS idx_word_list_kkutu_index ON word_list(kkutu_index)
"#;

/// Migration v1 node tables for the standard, reverse and long modes. The
/// word table itself comes from `WORD_TABLE_COLUMNS`.
const MIGRATION_V1_NODE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS endword_list (
    word_index CHAR(1) NOT NULL PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS attackword_list (
    word_index CHAR(1) NOT NULL PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS reverse_endword_list (
    word_index CHAR(1) NOT NULL PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS reverse_attackword_list (
    word_index CHAR(1) NOT NULL PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS kkutu_endword_list (
    word_index VARCHAR(2) NOT NULL PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS kkutu_attackword_list (
    word_index VARCHAR(2) NOT NULL PRIMARY KEY
)
"#;

/// Migration v2: node tables for the middle-character mode
const MIGRATION_V2: &str = r#"
CREATE TABLE IF NOT EXISTS middle_endword_list (
    word_index CHAR(1) NOT NULL PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS middle_attackword_list (
    word_index CHAR(1) NOT NULL PRIMARY KEY
)
"#;
