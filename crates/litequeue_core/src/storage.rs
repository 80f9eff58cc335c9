//! Storage seam between the engine and the durable store.

use async_trait::async_trait;
use litequeue_db::{queries, DbResult, Item, QueueDb};

/// Durable, ordered, keyed record store consumed by the engine.
///
/// Implementations must assign strictly increasing keys that are never
/// reused, return `select_oldest` results ascending by key, and treat deletes
/// of absent keys as success.
#[async_trait]
pub trait QueueStorage: Send + Sync + std::fmt::Debug {
    /// Append a payload, returning its assigned key.
    async fn insert(&self, data: &[u8]) -> DbResult<i64>;

    /// Up to `limit` oldest records, ascending by key.
    async fn select_oldest(&self, limit: usize) -> DbResult<Vec<Item>>;

    /// Remove the record with `id` if present.
    async fn delete_by_key(&self, id: i64) -> DbResult<()>;

    /// Number of records present.
    async fn count(&self) -> DbResult<u64>;

    /// Release the underlying connection. Later calls fail.
    async fn close(&self);
}

#[async_trait]
impl QueueStorage for QueueDb {
    async fn insert(&self, data: &[u8]) -> DbResult<i64> {
        queries::insert_item(self.pool(), data).await
    }

    async fn select_oldest(&self, limit: usize) -> DbResult<Vec<Item>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        queries::get_oldest_items(self.pool(), limit).await
    }

    async fn delete_by_key(&self, id: i64) -> DbResult<()> {
        queries::delete_item(self.pool(), id).await?;
        Ok(())
    }

    async fn count(&self) -> DbResult<u64> {
        Ok(queries::count_items(self.pool()).await? as u64)
    }

    async fn close(&self) {
        QueueDb::close(self).await;
    }
}
