//! Litequeue Core - Durable FIFO Queue Engine
//!
//! Producers append opaque payloads with [`Queue::add`]; a supervised
//! background dispatcher delivers the oldest item, one at a time, to the
//! registered [`ItemHandler`]. Delivery is at-least-once: an item stays in the
//! queue until it is acknowledged.
//!
//! ```rust,ignore
//! use litequeue_core::{Disposition, Queue, QueueConfig};
//!
//! let queue = Queue::new(QueueConfig::default().with_locator("jobs.db")).await?;
//! queue.listen(|delivery| async move {
//!     println!("{}", delivery.item().data_lossy());
//!     Disposition::Ack
//! });
//! queue.add(b"hello").await?;
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod queue;
pub mod registry;
pub mod storage;
pub mod store;

pub use config::{QueueConfig, RestartPolicy};
pub use error::{ConfigError, CoreError, Result};
pub use handler::{handler_fn, Delivery, Disposition, FnHandler, ItemHandler};
pub use queue::Queue;
pub use registry::ListenerRegistry;
pub use storage::QueueStorage;
pub use store::Store;

pub use litequeue_db::{Item, Locator};
