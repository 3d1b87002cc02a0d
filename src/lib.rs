// Mirrored filesystem library - exposes all core modules for testing

pub mod config;
pub mod error;
pub mod model;
pub mod services;
pub mod store;

pub use config::{ConfigError, SyncConfig};
pub use error::SaveError;
pub use model::{Dirent, FileEntry, FileMap, FileModification, FileModifications, WatchEvent};
pub use services::fs::{FsProvider, MemoryProvider, WatchOptions};
pub use services::listeners::{FilesChanged, Subscription};
pub use store::{FileSyncStore, WatchHandle};
