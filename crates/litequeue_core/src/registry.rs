//! Listener registry: the handler the dispatcher currently delivers to.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::handler::ItemHandler;

/// Holds the active [`ItemHandler`], swappable at runtime.
///
/// The dispatcher takes a snapshot once per iteration, before fetching, so a
/// replacement applies from the next fetch onward. An invocation already in
/// flight keeps the handler it started with; concurrent replacements are
/// last-write-wins.
#[derive(Default)]
pub struct ListenerRegistry {
    current: RwLock<Option<Arc<dyn ItemHandler>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the active handler.
    pub fn set(&self, handler: Arc<dyn ItemHandler>) {
        *self.current.write() = Some(handler);
    }

    /// Remove the active handler; the dispatcher idles until a new one is set.
    pub fn clear(&self) {
        *self.current.write() = None;
    }

    /// Snapshot of the active handler.
    pub fn current(&self) -> Option<Arc<dyn ItemHandler>> {
        self.current.read().clone()
    }

    pub fn is_set(&self) -> bool {
        self.current.read().is_some()
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("is_set", &self.is_set())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{handler_fn, Disposition};

    #[test]
    fn test_set_replace_and_clear() {
        let registry = ListenerRegistry::new();
        assert!(registry.current().is_none());

        let first: Arc<dyn ItemHandler> = Arc::new(handler_fn(|_| async { Disposition::Ack }));
        registry.set(first.clone());
        let snapshot = registry.current().unwrap();
        assert!(Arc::ptr_eq(&snapshot, &first));

        let second: Arc<dyn ItemHandler> =
            Arc::new(handler_fn(|_| async { Disposition::Requeue }));
        registry.set(second.clone());

        // Earlier snapshots are unaffected by the swap.
        assert!(Arc::ptr_eq(&snapshot, &first));
        assert!(Arc::ptr_eq(&registry.current().unwrap(), &second));

        registry.clear();
        assert!(!registry.is_set());
    }
}
