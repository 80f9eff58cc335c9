//! Queue engine handle and lifecycle.

use std::future::Future;
use std::sync::Arc;

use litequeue_db::{Item, Locator, QueueDb};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::QueueConfig;
use crate::dispatch::{Supervisor, Worker};
use crate::error::{CoreError, Result};
use crate::handler::{handler_fn, Delivery, Disposition, ItemHandler};
use crate::registry::ListenerRegistry;
use crate::storage::QueueStorage;
use crate::store::Store;

/// Durable FIFO queue with a background dispatcher.
///
/// Cheap to clone; all clones share one store, one listener registry and one
/// dispatcher. Dropping the last clone cancels the dispatcher but does not
/// close storage; call [`close`](Self::close) or [`shutdown`](Self::shutdown)
/// for that.
#[derive(Debug, Clone)]
pub struct Queue {
    inner: Arc<QueueInner>,
}

#[derive(Debug)]
struct QueueInner {
    store: Store,
    listeners: Arc<ListenerRegistry>,
    cancel: CancellationToken,
    locator: Locator,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for QueueInner {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl Queue {
    /// Open the configured storage target and start dispatching.
    ///
    /// Returns as soon as the dispatcher is spawned; it does not wait for
    /// any item to be present.
    pub async fn new(config: QueueConfig) -> Result<Self> {
        config.validate()?;
        let locator = config.resolve_locator();

        let db = QueueDb::open(&locator, config.reset && !locator.is_transient())
            .await
            .map_err(|cause| CoreError::Construction {
                locator: locator.to_string(),
                cause,
            })?;

        info!("Queue opened at {}", locator);
        Ok(Self::start(Arc::new(db), locator, &config))
    }

    /// Open a fresh transient queue with default settings.
    pub async fn open_in_memory() -> Result<Self> {
        Self::new(QueueConfig::default()).await
    }

    /// Start an engine over caller-provided storage.
    ///
    /// `config.locator` is used only to label the queue; `config.reset` is
    /// ignored. Must be called from within a Tokio runtime.
    pub fn with_storage(storage: Arc<dyn QueueStorage>, config: &QueueConfig) -> Result<Self> {
        config.validate()?;
        let locator = config.resolve_locator();
        Ok(Self::start(storage, locator, config))
    }

    fn start(storage: Arc<dyn QueueStorage>, locator: Locator, config: &QueueConfig) -> Self {
        let store = Store::new(storage);
        let listeners = Arc::new(ListenerRegistry::new());
        let cancel = CancellationToken::new();

        let worker = Worker::new(
            store.clone(),
            listeners.clone(),
            cancel.clone(),
            config.idle_interval(),
        );
        let dispatcher = Supervisor::new(worker, config.restart).start();

        Self {
            inner: Arc::new(QueueInner {
                store,
                listeners,
                cancel,
                locator,
                dispatcher: Mutex::new(Some(dispatcher)),
            }),
        }
    }

    /// Append a payload. The assigned id is not reported.
    pub async fn add(&self, data: impl AsRef<[u8]>) -> Result<()> {
        self.inner.store.add(data).await
    }

    /// Up to `limit` oldest items, ascending by id. Never removes anything.
    pub async fn get(&self, limit: usize) -> Result<Vec<Item>> {
        self.inner.store.get(limit).await
    }

    /// Remove an item. Removing an absent id succeeds.
    pub async fn delete(&self, id: i64) -> Result<()> {
        self.inner.store.delete(id).await
    }

    /// Number of items still queued.
    pub async fn len(&self) -> Result<u64> {
        self.inner.store.len().await
    }

    pub async fn is_empty(&self) -> Result<bool> {
        self.inner.store.is_empty().await
    }

    /// Replace the handler items are delivered to.
    pub fn listener(&self, handler: impl ItemHandler + 'static) {
        self.set_listener(Arc::new(handler));
    }

    /// Replace the handler with an already shared one.
    pub fn set_listener(&self, handler: Arc<dyn ItemHandler>) {
        debug!("Listener replaced on {}", self.inner.locator);
        self.inner.listeners.set(handler);
    }

    /// Replace the handler with an async closure.
    pub fn listen<F, Fut>(&self, f: F)
    where
        F: Fn(Delivery) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Disposition> + Send + 'static,
    {
        self.listener(handler_fn(f));
    }

    /// Remove the handler; items stay queued until a new one is registered.
    pub fn clear_listener(&self) {
        self.inner.listeners.clear();
    }

    /// Store handle sharing this queue's lock.
    pub fn store(&self) -> Store {
        self.inner.store.clone()
    }

    pub fn locator(&self) -> &Locator {
        &self.inner.locator
    }

    /// Whether [`close`](Self::close) or [`shutdown`](Self::shutdown) was called.
    pub fn is_closed(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Stop dispatching and close storage without waiting.
    ///
    /// A handler already running is not awaited and may see storage errors
    /// once the connection is closed underneath it.
    pub async fn close(&self) -> Result<()> {
        self.inner.cancel.cancel();
        self.inner.store.close().await;
        info!("Queue closed at {}", self.inner.locator);
        Ok(())
    }

    /// Stop dispatching, wait for the dispatcher (and any in-flight handler)
    /// to finish, then close storage.
    ///
    /// Must not be awaited from inside a handler of this queue.
    pub async fn shutdown(&self) -> Result<()> {
        self.inner.cancel.cancel();

        let dispatcher = self.inner.dispatcher.lock().take();
        if let Some(dispatcher) = dispatcher {
            if let Err(e) = dispatcher.await {
                warn!("Dispatch supervisor ended abnormally: {}", e);
            }
        }

        self.close().await
    }
}
