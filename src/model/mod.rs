//! Data types for the mirrored filesystem: snapshot entries, change events,
//! path helpers and the modification ledger.

pub mod entry;
pub mod event;
pub mod line_diff;
pub mod modifications;
pub mod path;

pub use entry::{count_files, Dirent, FileEntry, FileMap};
pub use event::{WatchEvent, WatchEventKind};
pub use modifications::{FileModification, FileModifications, ModificationLedger, ModificationPatch};
