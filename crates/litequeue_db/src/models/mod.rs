//! Database models.
//!
//! These structs map directly to database tables via sqlx.

mod item;

pub use item::Item;
