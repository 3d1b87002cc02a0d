use crate::model::path::is_within;
use crate::model::WatchEvent;
use async_trait::async_trait;
use std::io;
use tokio::sync::mpsc;

/// Receiving end of a watch subscription.
///
/// Each message is one batch of events as emitted by the provider. Dropping
/// the receiver ends the subscription.
pub type WatchStream = mpsc::UnboundedReceiver<Vec<WatchEvent>>;

/// Sending end held by providers
pub type WatchSink = mpsc::UnboundedSender<Vec<WatchEvent>>;

/// Which paths a watch subscription covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchOptions {
    /// Only paths equal to or below this directory are reported
    pub root: String,
    /// Paths with any of these segments are never reported
    pub exclude: Vec<String>,
    /// Whether file events carry their content
    pub include_content: bool,
}

impl WatchOptions {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            exclude: Vec::new(),
            include_content: true,
        }
    }

    pub fn with_exclude(mut self, segment: impl Into<String>) -> Self {
        self.exclude.push(segment.into());
        self
    }

    /// Check whether `path` falls under this subscription
    pub fn matches(&self, path: &str) -> bool {
        is_within(&self.root, path)
            && !path
                .split('/')
                .any(|segment| self.exclude.iter().any(|ex| ex == segment))
    }
}

/// Async filesystem provider trait
///
/// Abstracts the container runtime that owns the real filesystem. The store
/// only needs two things from it: a way to write a file, and a stream of
/// change events for the working tree.
#[async_trait]
pub trait FsProvider: Send + Sync {
    /// Write `content` to `relative_path` (relative to the working root)
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot complete the write.
    async fn write_file(&self, relative_path: &str, content: &str) -> io::Result<()>;

    /// Subscribe to change events for paths matching `options`
    ///
    /// The first batch on a new stream describes the tree as it currently
    /// exists; later batches describe changes.
    fn watch(&self, options: &WatchOptions) -> io::Result<WatchStream>;
}
