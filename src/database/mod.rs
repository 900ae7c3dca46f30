//! SQLite Dictionary Store
//!
//! Durable word and node tables. `Database` owns the connection pool and a
//! single-writer gate; write transactions hold the gate until they commit or
//! roll back, reads go straight to the pool.

mod migrations;
mod models;
mod nodes;
mod schema;
mod store;
mod words;

pub use migrations::run_migrations;
pub use models::*;
pub use nodes::NodeOps;
pub use schema::{upgrade_legacy_schema, SchemaOps};
pub use store::{SqliteTransaction, Store, StoreTransaction};
pub use words::WordOps;

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use tokio::sync::Mutex;
use tracing::info;

/// Default database file name inside the data directory.
pub const DEFAULT_DB_FILE: &str = "path.sqlite";

/// Database connection pool
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    path: PathBuf,
    write_gate: Arc<Mutex<()>>,
}

impl Database {
    /// Open (or create) `path.sqlite` inside `data_dir`.
    pub async fn new(data_dir: &Path) -> Result<Self, sqlx::Error> {
        Self::open(&data_dir.join(DEFAULT_DB_FILE), 5).await
    }

    /// Open (or create) the database file at `db_path`.
    pub async fn open(db_path: &Path, max_connections: u32) -> Result<Self, sqlx::Error> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", db_path.display()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .min_connections(1)
            .connect_with(options)
            .await?;

        let db = Self {
            pool,
            path: db_path.to_path_buf(),
            write_gate: Arc::new(Mutex::new(())),
        };

        // Legacy tables must be brought up to shape before indexes are created on them.
        if schema::upgrade_legacy_schema(&db).await? {
            db.vacuum().await?;
        }
        migrations::run_migrations(&db.pool).await?;

        info!(path = %db.path.display(), "Dictionary database ready");
        Ok(db)
    }

    /// Get the underlying pool for direct queries
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get database file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Start a write transaction, waiting for any other writer to finish.
    pub async fn begin_write(&self) -> Result<SqliteTransaction, sqlx::Error> {
        let gate = self.write_gate.clone().lock_owned().await;
        let tx = self.pool.begin().await?;
        Ok(SqliteTransaction::new(tx, gate))
    }

    /// Run `VACUUM` while holding the writer gate.
    pub async fn vacuum(&self) -> Result<(), sqlx::Error> {
        let _gate = self.write_gate.lock().await;
        sqlx::query("VACUUM").execute(&self.pool).await?;
        Ok(())
    }

    pub(crate) fn write_gate(&self) -> &Mutex<()> {
        &self.write_gate
    }
}
