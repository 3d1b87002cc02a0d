//! Change listeners for the file store.
//!
//! Consumers (file tree, editor tabs, diff view) register a callback and get
//! told which paths changed after every committed mutation. Callbacks run
//! after the store has released its lock, so they may read the store.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Paths touched by one committed mutation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilesChanged {
    pub paths: BTreeSet<String>,
}

impl FilesChanged {
    pub fn single(path: impl Into<String>) -> Self {
        Self {
            paths: BTreeSet::from([path.into()]),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }
}

/// Type for listener callbacks
pub type ListenerCallback = Arc<dyn Fn(&FilesChanged) + Send + Sync>;

type ListenerMap = Mutex<BTreeMap<u64, ListenerCallback>>;

/// Registry of change listeners
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: Arc<ListenerMap>,
    next_id: AtomicU64,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(map: &ListenerMap) -> MutexGuard<'_, BTreeMap<u64, ListenerCallback>> {
        map.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a listener. It stays registered until the returned
    /// [`Subscription`] is dropped or unsubscribed.
    pub fn subscribe(&self, callback: ListenerCallback) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        Self::lock(&self.listeners).insert(id, callback);

        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// Call every listener with `change`. Empty changes are not announced.
    pub fn notify(&self, change: &FilesChanged) {
        if change.is_empty() {
            return;
        }

        // Clone out so callbacks can subscribe/unsubscribe without deadlocking
        let callbacks: Vec<ListenerCallback> =
            Self::lock(&self.listeners).values().cloned().collect();
        for callback in callbacks {
            callback(change);
        }
    }

    /// Get count of registered listeners
    pub fn listener_count(&self) -> usize {
        Self::lock(&self.listeners).len()
    }
}

/// Handle for a registered listener
#[must_use = "dropping a Subscription unregisters the listener"]
pub struct Subscription {
    id: u64,
    listeners: Weak<ListenerMap>,
}

impl Subscription {
    /// Unregister the listener now
    pub fn unsubscribe(self) {
        // Drop does the work
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            ListenerRegistry::lock(&listeners).remove(&self.id);
        }
    }
}
