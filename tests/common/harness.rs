//! Store harness for integration tests
//!
//! Wires a `FileSyncStore` to a `MemoryProvider` rooted at `/proj` and starts
//! the watcher. Tests run with paused tokio time, so `settle` advances past
//! the buffer window deterministically.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use workbench_fs::services::fs::FsProvider;
use workbench_fs::{FilesChanged, FileSyncStore, MemoryProvider, Subscription, SyncConfig, WatchHandle};

pub const WORK_DIR: &str = "/proj";

pub struct StoreHarness {
    pub memory: Arc<MemoryProvider>,
    pub store: Arc<FileSyncStore>,
    pub changes: Arc<Mutex<Vec<FilesChanged>>>,
    watch: Option<WatchHandle>,
    _subscription: Subscription,
}

impl StoreHarness {
    /// Harness over a fresh in-memory tree, default config rooted at `/proj`
    pub fn new() -> Self {
        let memory = Arc::new(MemoryProvider::new(WORK_DIR));
        Self::with_provider(memory.clone(), memory, SyncConfig::with_work_dir(WORK_DIR))
    }

    /// Harness whose store talks to `provider` (for example a slow wrapper
    /// around `memory`)
    pub fn with_provider(
        memory: Arc<MemoryProvider>,
        provider: Arc<dyn FsProvider>,
        config: SyncConfig,
    ) -> Self {
        super::tracing::init_tracing_from_env();

        let store = Arc::new(FileSyncStore::new(provider, config));
        let changes: Arc<Mutex<Vec<FilesChanged>>> = Arc::default();
        let sink = Arc::clone(&changes);
        let subscription = store.subscribe(move |change| {
            sink.lock().unwrap().push(change.clone());
        });

        Self {
            memory,
            store,
            changes,
            watch: None,
            _subscription: subscription,
        }
    }

    /// Start mirroring the provider
    pub fn start(&mut self) {
        self.watch = Some(self.store.start_watching().unwrap());
    }

    /// Stop mirroring the provider
    pub fn stop(&mut self) {
        if let Some(handle) = self.watch.take() {
            handle.stop();
        }
    }

    /// Let the buffer window elapse so pending events are applied
    pub async fn settle(&self) {
        let window = self.store.config().buffer_window();
        tokio::time::sleep(window + Duration::from_millis(10)).await;
    }

    /// Number of change notifications seen so far
    pub fn notification_count(&self) -> usize {
        self.changes.lock().unwrap().len()
    }

    pub fn take_changes(&self) -> Vec<FilesChanged> {
        std::mem::take(&mut *self.changes.lock().unwrap())
    }
}
