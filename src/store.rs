//! The file sync store.
//!
//! `FileSyncStore` mirrors the container filesystem in memory. It is fed by
//! the provider's change-event stream (coalesced by the event buffer) and by
//! user saves, which write through to the provider before updating the
//! snapshot. A modification ledger remembers what each saved file looked like
//! before its first edit since the last reset.

use crate::config::SyncConfig;
use crate::error::SaveError;
use crate::model::path::{normalize_lexically, relative_to_root};
use crate::model::{
    count_files, Dirent, FileEntry, FileMap, FileModifications, ModificationLedger, WatchEvent,
    WatchEventKind,
};
use crate::services::content::file_entry_from_buffer;
use crate::services::event_buffer::run_buffered;
use crate::services::fs::FsProvider;
use crate::services::listeners::{FilesChanged, ListenerCallback, ListenerRegistry, Subscription};
use std::collections::BTreeSet;
use std::io;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::task::JoinHandle;

#[derive(Debug, Default)]
struct StoreState {
    files: FileMap,
    modified: ModificationLedger,
}

/// In-memory mirror of the working directory
pub struct FileSyncStore {
    provider: Arc<dyn FsProvider>,
    config: SyncConfig,
    state: RwLock<StoreState>,
    listeners: ListenerRegistry,
}

impl FileSyncStore {
    /// Create an empty store. Nothing is mirrored until events are applied,
    /// usually by [`FileSyncStore::start_watching`].
    pub fn new(provider: Arc<dyn FsProvider>, config: SyncConfig) -> Self {
        Self {
            provider,
            config,
            state: RwLock::new(StoreState::default()),
            listeners: ListenerRegistry::new(),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    fn read_state(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// The file at `path`, or `None` for missing paths and directories
    pub fn get_file(&self, path: &str) -> Option<FileEntry> {
        self.read_state()
            .files
            .get(&normalize_lexically(path))
            .and_then(Dirent::as_file)
            .cloned()
    }

    /// Whether `path` is a mirrored directory
    pub fn is_dir(&self, path: &str) -> bool {
        self.read_state()
            .files
            .get(&normalize_lexically(path))
            .is_some_and(Dirent::is_dir)
    }

    /// Copy of the whole snapshot
    pub fn files(&self) -> FileMap {
        self.read_state().files.clone()
    }

    /// Number of file entries in the snapshot (directories excluded)
    pub fn files_count(&self) -> usize {
        count_files(&self.read_state().files)
    }

    /// Pair every ledger entry with the current snapshot content.
    ///
    /// Computed on each call; paths that are no longer files are skipped.
    pub fn get_modifications(&self) -> FileModifications {
        let state = self.read_state();
        state.modified.compute(&state.files)
    }

    /// Forget all recorded originals. The snapshot is left untouched.
    pub fn reset_modifications(&self) {
        self.write_state().modified.clear();
    }

    /// Register a change listener
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&FilesChanged) + Send + Sync + 'static,
    {
        let callback: ListenerCallback = Arc::new(listener);
        self.listeners.subscribe(callback)
    }

    /// Write `content` to `path` through the provider, then update the
    /// snapshot and record the pre-edit original if this is the first save to
    /// `path` since the last reset.
    ///
    /// Nothing is committed if the write fails or times out. Until the write
    /// returns, readers still see the previous content.
    pub async fn save_file(&self, path: &str, content: &str) -> Result<(), SaveError> {
        let result = self.save_file_inner(path, content).await;
        if let Err(e) = &result {
            tracing::error!("Failed to save {}: {}", path, e);
        }
        result
    }

    async fn save_file_inner(&self, path: &str, content: &str) -> Result<(), SaveError> {
        let relative =
            relative_to_root(&self.config.work_dir, path).ok_or_else(|| SaveError::InvalidPath {
                path: path.to_string(),
            })?;
        let key = normalize_lexically(path);

        let original = self
            .get_file(&key)
            .map(|entry| entry.content)
            .ok_or_else(|| SaveError::InternalConsistency { path: key.clone() })?;

        let timeout = self.config.write_timeout();
        match tokio::time::timeout(timeout, self.provider.write_file(&relative, content)).await {
            Err(_elapsed) => {
                return Err(SaveError::WriteTimeout {
                    path: key,
                    timeout,
                })
            }
            Ok(Err(source)) => return Err(SaveError::Write { path: key, source }),
            Ok(Ok(())) => {}
        }

        {
            let mut state = self.write_state();
            state.modified.record(&key, &original);
            state
                .files
                .insert(key.clone(), Dirent::File(FileEntry::text(content)));
        }

        self.listeners.notify(&FilesChanged::single(key.as_str()));
        tracing::info!("File updated: {}", key);
        Ok(())
    }

    /// Apply one coalesced batch of watch events in order.
    ///
    /// The whole batch is applied under a single lock acquisition, so readers
    /// see either none of it or all of it. Listeners are told about every
    /// touched path once the lock is released.
    pub fn apply_events(&self, events: Vec<WatchEvent>) {
        if events.is_empty() {
            return;
        }

        let mut changed = BTreeSet::new();
        {
            let mut state = self.write_state();
            for event in &events {
                if let Some(path) =
                    apply_event(&mut state.files, event, self.config.binary_sample_len)
                {
                    changed.insert(path);
                }
            }
        }

        tracing::debug!(
            "Applied {} watch events, {} paths changed",
            events.len(),
            changed.len()
        );
        self.listeners.notify(&FilesChanged { paths: changed });
    }

    /// Subscribe to the provider and keep the snapshot in sync in a
    /// background task.
    ///
    /// Must be called from within a tokio runtime. The task runs until the
    /// returned handle is stopped or dropped, or the provider closes the
    /// stream.
    pub fn start_watching(self: &Arc<Self>) -> io::Result<WatchHandle> {
        let options = self.config.watch_options();
        let stream = self.provider.watch(&options)?;
        let window = self.config.buffer_window();
        let store = Arc::clone(self);

        tracing::info!("Watching {} (buffer window {:?})", options.root, window);
        let task = tokio::spawn(async move {
            run_buffered(stream, window, move |events| store.apply_events(events)).await;
            tracing::debug!("Watch stream closed");
        });

        Ok(WatchHandle { task })
    }
}

/// Apply a single event to `files`, returning the key it touched.
///
/// Every event kind is idempotent. Unknown kinds are logged and skipped.
pub fn apply_event(files: &mut FileMap, event: &WatchEvent, sample_len: usize) -> Option<String> {
    // Same key form as save_file, so `/proj//a.txt` and `/proj/a.txt` agree
    let key = normalize_lexically(&event.path);

    match &event.kind {
        WatchEventKind::AddDir => {
            files.insert(key.clone(), Dirent::Directory);
        }
        WatchEventKind::RemoveDir => {
            let prefix = if key == "/" { key.clone() } else { format!("{key}/") };
            files.retain(|path, _| *path != key && !path.starts_with(&prefix));
        }
        WatchEventKind::AddFile | WatchEventKind::Change => {
            let entry = file_entry_from_buffer(&key, event.buffer.as_deref(), sample_len);
            files.insert(key.clone(), Dirent::File(entry));
        }
        WatchEventKind::RemoveFile => {
            files.remove(&key);
        }
        WatchEventKind::UpdateDirectory => return None,
        WatchEventKind::Unknown(kind) => {
            tracing::warn!("Ignoring unknown watch event '{}' for {}", kind, event.path);
            return None;
        }
    }

    Some(key)
}

/// Handle to the background watch task started by
/// [`FileSyncStore::start_watching`]. Dropping it stops the task.
#[derive(Debug)]
pub struct WatchHandle {
    task: JoinHandle<()>,
}

impl WatchHandle {
    /// Stop watching. Events already applied stay in the snapshot.
    pub fn stop(self) {
        // Drop aborts the task
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
