//! Store API: queue semantics over a [`QueueStorage`].

use std::sync::Arc;

use litequeue_db::Item;
use tokio::sync::{Mutex, Notify};
use tracing::debug;

use crate::error::{CoreError, Result};
use crate::storage::QueueStorage;

/// Handle to a queue's items.
///
/// Every operation, from any clone, runs inside one mutual-exclusion section,
/// so at most one store call executes at a time per queue. Reads and writes
/// are not distinguished.
#[derive(Debug, Clone)]
pub struct Store {
    storage: Arc<dyn QueueStorage>,
    lock: Arc<Mutex<()>>,
    /// Wakes an idle dispatcher when an item is added
    added: Arc<Notify>,
}

impl Store {
    pub(crate) fn new(storage: Arc<dyn QueueStorage>) -> Self {
        Self {
            storage,
            lock: Arc::new(Mutex::new(())),
            added: Arc::new(Notify::new()),
        }
    }

    /// Append a payload at the tail of the queue.
    pub async fn add(&self, data: impl AsRef<[u8]>) -> Result<()> {
        let guard = self.lock.lock().await;
        let id = self
            .storage
            .insert(data.as_ref())
            .await
            .map_err(|e| CoreError::storage("add", e))?;
        debug!("Queued item {}", id);
        drop(guard);

        self.added.notify_one();
        Ok(())
    }

    /// Oldest `limit` items, ascending by id. Never removes anything.
    pub async fn get(&self, limit: usize) -> Result<Vec<Item>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let _guard = self.lock.lock().await;
        self.storage
            .select_oldest(limit)
            .await
            .map_err(|e| CoreError::storage("get", e))
    }

    /// Remove an item. Removing an absent id succeeds.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.storage
            .delete_by_key(id)
            .await
            .map_err(|e| CoreError::storage("delete", e))?;
        debug!("Deleted item {}", id);
        Ok(())
    }

    /// Number of items still queued.
    pub async fn len(&self) -> Result<u64> {
        let _guard = self.lock.lock().await;
        self.storage
            .count()
            .await
            .map_err(|e| CoreError::storage("len", e))
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    pub(crate) fn added(&self) -> &Notify {
        &self.added
    }

    pub(crate) async fn close(&self) {
        self.storage.close().await;
    }
}
