//! Database query functions.
//!
//! - `item`: insert, peek, and delete on the `queue` table

mod item;

pub use item::*;
