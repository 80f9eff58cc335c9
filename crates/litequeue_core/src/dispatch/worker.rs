//! Dispatch worker: peek one item, deliver it, settle the outcome.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::handler::{Delivery, Disposition};
use crate::registry::ListenerRegistry;
use crate::store::Store;

/// State shared by every worker a supervisor spawns.
///
/// Cloning yields a fresh worker over the same store and registry; nothing
/// carries over between runs.
#[derive(Debug, Clone)]
pub(crate) struct Worker {
    store: Store,
    listeners: Arc<ListenerRegistry>,
    cancel: CancellationToken,
    idle_interval: Duration,
}

impl Worker {
    pub(crate) fn new(
        store: Store,
        listeners: Arc<ListenerRegistry>,
        cancel: CancellationToken,
        idle_interval: Duration,
    ) -> Self {
        Self {
            store,
            listeners,
            cancel,
            idle_interval,
        }
    }

    pub(crate) fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Run until cancelled. Cancellation is observed once per iteration; a
    /// handler invocation in progress is never interrupted.
    pub(crate) async fn run(self) {
        while !self.cancel.is_cancelled() {
            self.step().await;
        }
        debug!("Dispatch worker stopped");
    }

    async fn step(&self) {
        // No handler behaves like a no-op handler, without redelivering in a loop
        let Some(handler) = self.listeners.current() else {
            self.wait_idle().await;
            return;
        };

        let item = match self.store.get(1).await {
            Ok(items) => items.into_iter().next(),
            Err(e) => {
                if !self.cancel.is_cancelled() {
                    error!("Failed to fetch next queued item: {}", e);
                }
                // Retry right away, but let other tasks run
                tokio::task::yield_now().await;
                return;
            }
        };

        let Some(item) = item else {
            self.wait_idle().await;
            return;
        };

        let id = item.id;
        debug!("Dispatching item {}", id);
        let disposition = handler.handle(Delivery::new(item, self.store.clone())).await;
        self.settle(id, disposition).await;
    }

    async fn settle(&self, id: i64, disposition: Disposition) {
        match disposition {
            Disposition::Ack => {
                if let Err(e) = self.store.delete(id).await {
                    warn!("Failed to acknowledge item {}, it will be redelivered: {}", id, e);
                }
            }
            Disposition::Requeue => {
                debug!("Item {} requeued", id);
                tokio::task::yield_now().await;
            }
            Disposition::RequeueAfter(_) => match disposition.delay() {
                Some(delay) => {
                    debug!("Item {} requeued, pausing dispatch for {:?}", id, delay);
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = self.cancel.cancelled() => {}
                    }
                }
                None => tokio::task::yield_now().await,
            },
        }
    }

    /// Wait for an add, the idle interval, or cancellation.
    async fn wait_idle(&self) {
        tokio::select! {
            _ = self.store.added().notified() => {}
            _ = tokio::time::sleep(self.idle_interval) => {}
            _ = self.cancel.cancelled() => {}
        }
    }
}
