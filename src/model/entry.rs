//! Snapshot entry types.
//!
//! A snapshot maps absolute, `/`-separated paths to a [`Dirent`]. Removal
//! deletes the key; there are no tombstones.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A file as seen by the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Decoded UTF-8 content. Always empty for binary files.
    pub content: String,
    /// Whether the content sample looked binary
    pub is_binary: bool,
}

impl FileEntry {
    /// Create a text file entry
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_binary: false,
        }
    }

    /// Create a binary file entry (content is never kept)
    pub fn binary() -> Self {
        Self {
            content: String::new(),
            is_binary: true,
        }
    }
}

/// Either a file or a directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Dirent {
    File(FileEntry),
    Directory,
}

impl Dirent {
    pub fn is_file(&self) -> bool {
        matches!(self, Dirent::File(_))
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Dirent::Directory)
    }

    /// Borrow the file entry, if this is a file
    pub fn as_file(&self) -> Option<&FileEntry> {
        match self {
            Dirent::File(file) => Some(file),
            Dirent::Directory => None,
        }
    }
}

/// Path-keyed snapshot of the mirrored filesystem.
///
/// Ordered so that iteration (and the CLI dump) is stable.
pub type FileMap = BTreeMap<String, Dirent>;

/// Count the file entries in a snapshot. Directories are excluded.
pub fn count_files(files: &FileMap) -> usize {
    files.values().filter(|dirent| dirent.is_file()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirent_kinds() {
        let file = Dirent::File(FileEntry::text("hi"));
        assert!(file.is_file());
        assert!(!file.is_dir());
        assert_eq!(file.as_file().map(|f| f.content.as_str()), Some("hi"));

        let dir = Dirent::Directory;
        assert!(dir.is_dir());
        assert!(dir.as_file().is_none());
    }

    #[test]
    fn test_binary_entry_has_no_content() {
        let entry = FileEntry::binary();
        assert!(entry.is_binary);
        assert!(entry.content.is_empty());
    }

    #[test]
    fn test_count_files_skips_directories() {
        let mut files = FileMap::new();
        files.insert("/proj".into(), Dirent::Directory);
        files.insert("/proj/a.txt".into(), Dirent::File(FileEntry::text("a")));
        files.insert("/proj/b.png".into(), Dirent::File(FileEntry::binary()));

        assert_eq!(count_files(&files), 2);
    }

    #[test]
    fn test_dirent_serializes_with_type_tag() {
        let json = serde_json::to_string(&Dirent::Directory).unwrap();
        assert_eq!(json, r#"{"type":"directory"}"#);

        let file: Dirent =
            serde_json::from_str(r#"{"type":"file","content":"x","is_binary":false}"#).unwrap();
        assert_eq!(file, Dirent::File(FileEntry::text("x")));
    }
}
