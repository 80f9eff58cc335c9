//! Consumer-side contract for delivered items.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use litequeue_db::Item;

use crate::error::Result;
use crate::store::Store;

/// What the dispatcher should do with an item once its handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Processing finished; delete the item.
    Ack,
    /// Keep the item and redeliver it on the next iteration.
    Requeue,
    /// Keep the item and pause dispatch for the given duration first.
    RequeueAfter(Duration),
}

impl Disposition {
    /// Whether the item should be deleted.
    pub fn acknowledges(&self) -> bool {
        matches!(self, Self::Ack)
    }

    /// Pause requested before the next dispatch iteration, if any.
    pub fn delay(&self) -> Option<Duration> {
        match self {
            Self::RequeueAfter(delay) if !delay.is_zero() => Some(*delay),
            _ => None,
        }
    }
}

/// One delivery of an item to a handler.
///
/// Carries a store handle so the handler can acknowledge the item itself
/// (for example before doing slow follow-up work).
#[derive(Debug, Clone)]
pub struct Delivery {
    item: Item,
    store: Store,
}

impl Delivery {
    pub(crate) fn new(item: Item, store: Store) -> Self {
        Self { item, store }
    }

    pub fn item(&self) -> &Item {
        &self.item
    }

    pub fn id(&self) -> i64 {
        self.item.id
    }

    pub fn data(&self) -> &[u8] {
        &self.item.data
    }

    /// Delete the item now. Safe to combine with returning [`Disposition::Ack`].
    pub async fn ack(&self) -> Result<()> {
        self.store.delete(self.item.id).await
    }

    /// Store the item came from.
    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn into_item(self) -> Item {
        self.item
    }
}

/// Consumer invoked once per delivered item.
///
/// Runs on the dispatcher; no other item is delivered until it returns. A
/// panic is treated as a fault: the dispatcher is restarted and the item,
/// never acknowledged, is delivered again.
#[async_trait]
pub trait ItemHandler: Send + Sync {
    async fn handle(&self, delivery: Delivery) -> Disposition;
}

/// [`ItemHandler`] backed by an async closure.
pub struct FnHandler<F>(F);

/// Wrap an async closure as an [`ItemHandler`].
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(Delivery) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Disposition> + Send + 'static,
{
    FnHandler(f)
}

#[async_trait]
impl<F, Fut> ItemHandler for FnHandler<F>
where
    F: Fn(Delivery) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Disposition> + Send + 'static,
{
    async fn handle(&self, delivery: Delivery) -> Disposition {
        (self.0)(delivery).await
    }
}

impl<F> std::fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disposition_delay() {
        assert_eq!(Disposition::Ack.delay(), None);
        assert_eq!(Disposition::Requeue.delay(), None);
        assert_eq!(Disposition::RequeueAfter(Duration::ZERO).delay(), None);
        assert_eq!(
            Disposition::RequeueAfter(Duration::from_millis(30)).delay(),
            Some(Duration::from_millis(30))
        );
    }

    #[test]
    fn test_only_ack_acknowledges() {
        assert!(Disposition::Ack.acknowledges());
        assert!(!Disposition::Requeue.acknowledges());
        assert!(!Disposition::RequeueAfter(Duration::from_secs(1)).acknowledges());
    }
}
