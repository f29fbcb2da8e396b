//! ContainerSlot: the one swappable cell every lazy listener resolves through.

use std::sync::{Arc, PoisonError, RwLock};

use lazybus_core::{ContainerError, Service, SharedContainer};
use tracing::trace;

/// Shared handle to the current container. Clones point at the same cell, so
/// `replace` redirects every listener that holds a clone, including ones created earlier.
#[derive(Clone)]
pub struct ContainerSlot(Arc<RwLock<SharedContainer>>);

impl ContainerSlot {
    pub fn new(container: SharedContainer) -> Self {
        Self(Arc::new(RwLock::new(container)))
    }

    pub fn current(&self) -> SharedContainer {
        let guard = self.0.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Put `container` in the slot and return the previous one.
    pub fn replace(&self, container: SharedContainer) -> SharedContainer {
        let mut guard = self.0.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, container)
    }

    /// Resolve `key` from the current container. The container lock is released on return.
    pub fn resolve(&self, key: &str) -> Result<Arc<dyn Service>, ContainerError> {
        trace!(key, "resolving from container slot");
        let container = self.current();
        let mut guard = container.lock().unwrap_or_else(PoisonError::into_inner);
        guard.resolve_service(key)
    }
}
