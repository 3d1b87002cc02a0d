//! In-memory filesystem provider
//!
//! Keeps a path-keyed tree of files and directories and emits the same kind of
//! change events a container runtime would. Used by tests and by the replay
//! CLI; it also lets callers inject raw events and write failures.

use super::provider::{FsProvider, WatchOptions, WatchSink, WatchStream};
use crate::model::path::{normalize_key, normalize_lexically};
use crate::model::WatchEvent;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
enum MemNode {
    File(Vec<u8>),
    Directory,
}

#[derive(Default)]
struct MemState {
    nodes: BTreeMap<String, MemNode>,
    watchers: Vec<(WatchOptions, WatchSink)>,
}

impl MemState {
    /// Send a batch to every matching watcher, dropping closed subscriptions
    fn dispatch(&mut self, events: &[WatchEvent]) {
        self.watchers.retain(|(options, sink)| {
            let batch: Vec<WatchEvent> = events
                .iter()
                .filter(|event| options.matches(normalize_key(&event.path)))
                .map(|event| strip_content(event, options))
                .collect();

            if batch.is_empty() {
                return !sink.is_closed();
            }
            sink.send(batch).is_ok()
        });
    }

    /// Create `path` and any missing parents, returning the add_dir events
    fn ensure_dir(&mut self, path: &str) -> Vec<WatchEvent> {
        let mut events = Vec::new();
        let mut current = String::new();

        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current.push('/');
            current.push_str(segment);
            if !self.nodes.contains_key(&current) {
                self.nodes.insert(current.clone(), MemNode::Directory);
                events.push(WatchEvent::add_dir(current.clone()));
            }
        }

        events
    }
}

fn strip_content(event: &WatchEvent, options: &WatchOptions) -> WatchEvent {
    if options.include_content {
        event.clone()
    } else {
        WatchEvent {
            buffer: None,
            ..event.clone()
        }
    }
}

fn parent_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(idx) => &path[..idx],
    }
}

/// In-memory provider rooted at a working directory
pub struct MemoryProvider {
    work_dir: String,
    state: Mutex<MemState>,
    fail_writes: AtomicBool,
}

impl MemoryProvider {
    /// Create a provider whose working directory already exists
    pub fn new(work_dir: impl Into<String>) -> Self {
        let work_dir = normalize_lexically(&work_dir.into());
        let mut state = MemState::default();
        state.ensure_dir(&work_dir);

        Self {
            work_dir,
            state: Mutex::new(state),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn work_dir(&self) -> &str {
        &self.work_dir
    }

    fn lock(&self) -> MutexGuard<'_, MemState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every following `write_file` call fail until reset
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Create a directory (and missing parents)
    pub fn mkdir(&self, path: &str) {
        let path = normalize_lexically(path);
        let mut state = self.lock();
        let events = state.ensure_dir(&path);
        state.dispatch(&events);
    }

    /// Create or overwrite a file, creating missing parent directories
    pub fn write(&self, path: &str, content: impl Into<Vec<u8>>) {
        let path = normalize_lexically(path);
        let content = content.into();
        let mut state = self.lock();

        let mut events = state.ensure_dir(parent_of(&path));
        let existed = matches!(state.nodes.get(&path), Some(MemNode::File(_)));
        state.nodes.insert(path.clone(), MemNode::File(content.clone()));

        events.push(if existed {
            WatchEvent::change(path, content)
        } else {
            WatchEvent::add_file(path, content)
        });
        state.dispatch(&events);
    }

    /// Remove a file, or a directory with everything below it.
    ///
    /// A directory removal is reported as a single `remove_dir` event.
    pub fn remove(&self, path: &str) -> io::Result<()> {
        let path = normalize_lexically(path);
        let mut state = self.lock();

        let event = match state.nodes.remove(&path) {
            Some(MemNode::File(_)) => WatchEvent::remove_file(path),
            Some(MemNode::Directory) => {
                let prefix = format!("{path}/");
                state.nodes.retain(|key, _| !key.starts_with(&prefix));
                WatchEvent::remove_dir(path)
            }
            None => {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no such file or directory: {path}"),
                ))
            }
        };

        state.dispatch(&[event]);
        Ok(())
    }

    /// Send raw events to watchers without touching the tree
    pub fn emit(&self, events: Vec<WatchEvent>) {
        self.lock().dispatch(&events);
    }

    /// Read a file's bytes
    pub fn read(&self, path: &str) -> Option<Vec<u8>> {
        match self.lock().nodes.get(&normalize_lexically(path)) {
            Some(MemNode::File(content)) => Some(content.clone()),
            _ => None,
        }
    }

    pub fn exists(&self, path: &str) -> bool {
        self.lock().nodes.contains_key(&normalize_lexically(path))
    }

    /// Number of live watch subscriptions
    pub fn watcher_count(&self) -> usize {
        let mut state = self.lock();
        state.watchers.retain(|(_, sink)| !sink.is_closed());
        state.watchers.len()
    }
}

#[async_trait]
impl FsProvider for MemoryProvider {
    async fn write_file(&self, relative_path: &str, content: &str) -> io::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::other(format!(
                "write rejected by provider: {relative_path}"
            )));
        }

        let path = format!("{}/{}", self.work_dir, relative_path);
        self.write(&path, content.as_bytes());
        Ok(())
    }

    fn watch(&self, options: &WatchOptions) -> io::Result<WatchStream> {
        let (sink, stream) = mpsc::unbounded_channel();
        let mut state = self.lock();

        // Parents sort before their children, so the initial batch is ordered
        let initial: Vec<WatchEvent> = state
            .nodes
            .iter()
            .filter(|(path, _)| options.matches(path))
            .map(|(path, node)| match node {
                MemNode::Directory => WatchEvent::add_dir(path.clone()),
                MemNode::File(content) => WatchEvent::add_file(path.clone(), content.clone()),
            })
            .map(|event| strip_content(&event, options))
            .collect();

        if !initial.is_empty() {
            sink.send(initial)
                .map_err(|_| io::Error::other("watch stream closed"))?;
        }

        state.watchers.push((options.clone(), sink));
        Ok(stream)
    }
}
