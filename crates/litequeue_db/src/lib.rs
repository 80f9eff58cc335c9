//! Litequeue Database Layer
//!
//! SQLite-based storage backend for litequeue engines.
//!
//! # Architecture
//!
//! - **One database per locator** - Engines opened on the same locator share it
//! - **File or transient targets** - A [`Locator`] names either a database file
//!   or a named in-memory database
//! - **Monotonic keys** - `AUTOINCREMENT` ids are strictly increasing and never reused
//!
//! # Usage
//!
//! ```rust,ignore
//! use litequeue_db::{Locator, QueueDb};
//!
//! let db = QueueDb::open(&Locator::parse("path/to/queue.db"), false).await?;
//! litequeue_db::queries::insert_item(db.pool(), b"payload").await?;
//! ```

pub mod connection;
pub mod error;
pub mod locator;
pub mod models;
pub mod queries;

pub use connection::{QueueDb, QueueStats};
pub use error::{DbError, DbResult};
pub use locator::{Locator, LocatorFactory, TRANSIENT_LOCATORS};
pub use models::Item;
