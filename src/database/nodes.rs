//! Node table operations

use super::Database;
use crate::core::node::NodeCategory;
use sqlx::Row;

/// Extension trait for node table reads
pub trait NodeOps {
    fn list_nodes(&self, category: NodeCategory) -> impl std::future::Future<Output = Result<Vec<String>, sqlx::Error>> + Send;
    fn node_count(&self, category: NodeCategory) -> impl std::future::Future<Output = Result<i64, sqlx::Error>> + Send;
}

impl NodeOps for Database {
    async fn list_nodes(&self, category: NodeCategory) -> Result<Vec<String>, sqlx::Error> {
        let rows = sqlx::query(&format!(
            "SELECT word_index FROM {} ORDER BY word_index",
            category.table_name()
        ))
        .fetch_all(self.pool())
        .await?;

        rows.iter().map(|r| r.try_get("word_index")).collect()
    }

    async fn node_count(&self, category: NodeCategory) -> Result<i64, sqlx::Error> {
        let row = sqlx::query(&format!("SELECT COUNT(*) as count FROM {}", category.table_name()))
            .fetch_one(self.pool())
            .await?;
        row.try_get("count")
    }
}
