//! Change events emitted by a filesystem provider.

use std::fmt;

/// Kind of a path watcher event.
///
/// Kinds the store does not know about are kept verbatim in `Unknown` so they
/// can be reported.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WatchEventKind {
    AddDir,
    RemoveDir,
    AddFile,
    Change,
    RemoveFile,
    /// Directory metadata changed. Not tracked.
    UpdateDirectory,
    Unknown(String),
}

impl WatchEventKind {
    pub fn as_str(&self) -> &str {
        match self {
            WatchEventKind::AddDir => "add_dir",
            WatchEventKind::RemoveDir => "remove_dir",
            WatchEventKind::AddFile => "add_file",
            WatchEventKind::Change => "change",
            WatchEventKind::RemoveFile => "remove_file",
            WatchEventKind::UpdateDirectory => "update_directory",
            WatchEventKind::Unknown(name) => name,
        }
    }
}

impl From<&str> for WatchEventKind {
    fn from(name: &str) -> Self {
        match name {
            "add_dir" => WatchEventKind::AddDir,
            "remove_dir" => WatchEventKind::RemoveDir,
            "add_file" => WatchEventKind::AddFile,
            "change" => WatchEventKind::Change,
            "remove_file" => WatchEventKind::RemoveFile,
            "update_directory" => WatchEventKind::UpdateDirectory,
            other => WatchEventKind::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for WatchEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single change notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub kind: WatchEventKind,
    /// Absolute path, possibly with trailing slashes
    pub path: String,
    /// Raw file content for `add_file` / `change` events
    pub buffer: Option<Vec<u8>>,
}

impl WatchEvent {
    pub fn new(kind: WatchEventKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            buffer: None,
        }
    }

    pub fn with_buffer(mut self, buffer: impl Into<Vec<u8>>) -> Self {
        self.buffer = Some(buffer.into());
        self
    }

    pub fn add_dir(path: impl Into<String>) -> Self {
        Self::new(WatchEventKind::AddDir, path)
    }

    pub fn remove_dir(path: impl Into<String>) -> Self {
        Self::new(WatchEventKind::RemoveDir, path)
    }

    pub fn add_file(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self::new(WatchEventKind::AddFile, path).with_buffer(content)
    }

    pub fn change(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self::new(WatchEventKind::Change, path).with_buffer(content)
    }

    pub fn remove_file(path: impl Into<String>) -> Self {
        Self::new(WatchEventKind::RemoveFile, path)
    }
}
