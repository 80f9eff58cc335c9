//! Queue item model.

use sqlx::FromRow;

/// A single queued payload.
///
/// Items are created by an insert, never mutated, and destroyed only by an
/// explicit delete.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Item {
    /// Storage-assigned key, strictly increasing and never reused
    pub id: i64,

    /// Opaque payload
    pub data: Vec<u8>,
}

impl Item {
    /// Payload as UTF-8, replacing invalid sequences.
    pub fn data_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }
}
