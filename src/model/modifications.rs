//! Tracking of user edits since the last checkpoint.
//!
//! The ledger remembers the content each file had *before* its first save in
//! the current tracking window. Pairing it with the live snapshot yields the
//! set of modifications that still has to be handed to the model.

use super::entry::FileMap;
use super::line_diff::unified_diff;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Original (pre-edit) content per path. First write wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModificationLedger {
    originals: BTreeMap<String, String>,
}

impl ModificationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember `original` for `path` unless an original is already recorded.
    ///
    /// Returns true when this call recorded it.
    pub fn record(&mut self, path: &str, original: &str) -> bool {
        if self.originals.contains_key(path) {
            return false;
        }
        self.originals.insert(path.to_string(), original.to_string());
        true
    }

    pub fn original(&self, path: &str) -> Option<&str> {
        self.originals.get(path).map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.originals.contains_key(path)
    }

    pub fn clear(&mut self) {
        self.originals.clear();
    }

    pub fn len(&self) -> usize {
        self.originals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.originals.is_empty()
    }

    /// Pair every recorded original with the snapshot's current content.
    ///
    /// Paths that are no longer files in the snapshot are skipped.
    pub fn compute(&self, files: &FileMap) -> FileModifications {
        let entries = self
            .originals
            .iter()
            .filter_map(|(path, original)| {
                let file = files.get(path)?.as_file()?;
                Some((
                    path.clone(),
                    FileModification {
                        original: original.clone(),
                        current: file.content.clone(),
                    },
                ))
            })
            .collect();

        FileModifications { entries }
    }
}

/// Content of one file before the first edit and now
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileModification {
    pub original: String,
    pub current: String,
}

/// How a modification is best described to a model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModificationPatch {
    /// Unified diff against the original
    Diff(String),
    /// Full current content, used when it is shorter than the diff
    File(String),
}

impl FileModification {
    pub fn is_unchanged(&self) -> bool {
        self.original == self.current
    }

    /// Describe the change for `path`, or `None` if the file ended up back at
    /// its original content.
    pub fn patch(&self, path: &str) -> Option<ModificationPatch> {
        if self.is_unchanged() {
            return None;
        }

        let diff = unified_diff(path, &self.original, &self.current);

        if diff.is_empty() || diff.len() > self.current.len() {
            Some(ModificationPatch::File(self.current.clone()))
        } else {
            Some(ModificationPatch::Diff(diff))
        }
    }
}

/// Modifications keyed by path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileModifications {
    entries: BTreeMap<String, FileModification>,
}

impl FileModifications {
    pub fn get(&self, path: &str) -> Option<&FileModification> {
        self.entries.get(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FileModification)> {
        self.entries.iter().map(|(path, m)| (path.as_str(), m))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Render every non-empty patch as a `<file_modifications>` block.
    ///
    /// Returns `None` when no file actually differs from its original.
    pub fn to_message(&self) -> Option<String> {
        let mut body = String::new();

        for (path, modification) in self.iter() {
            match modification.patch(path) {
                Some(ModificationPatch::Diff(diff)) => {
                    let _ = writeln!(body, "<diff path=\"{path}\">\n{diff}</diff>");
                }
                Some(ModificationPatch::File(content)) => {
                    let _ = writeln!(body, "<file path=\"{path}\">\n{content}\n</file>");
                }
                None => {}
            }
        }

        if body.is_empty() {
            None
        } else {
            Some(format!("<file_modifications>\n{body}</file_modifications>"))
        }
    }
}

impl<'a> IntoIterator for &'a FileModifications {
    type Item = (&'a String, &'a FileModification);
    type IntoIter = std::collections::btree_map::Iter<'a, String, FileModification>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entry::{Dirent, FileEntry};

    fn snapshot(files: &[(&str, &str)]) -> FileMap {
        files
            .iter()
            .map(|(path, content)| (path.to_string(), Dirent::File(FileEntry::text(*content))))
            .collect()
    }

    #[test]
    fn test_first_record_wins() {
        let mut ledger = ModificationLedger::new();
        assert!(!ledger.contains("/proj/a.txt"));
        assert!(ledger.record("/proj/a.txt", "v0"));
        assert!(ledger.contains("/proj/a.txt"));
        assert!(!ledger.record("/proj/a.txt", "v1"));
        assert_eq!(ledger.original("/proj/a.txt"), Some("v0"));
    }

    #[test]
    fn test_clear_starts_new_window() {
        let mut ledger = ModificationLedger::new();
        ledger.record("/proj/a.txt", "v0");
        ledger.clear();
        assert!(ledger.is_empty());
        assert!(!ledger.contains("/proj/a.txt"));
        assert!(ledger.record("/proj/a.txt", "v1"));
        assert_eq!(ledger.original("/proj/a.txt"), Some("v1"));
    }

    #[test]
    fn test_compute_pairs_original_with_current() {
        let mut ledger = ModificationLedger::new();
        ledger.record("/proj/a.txt", "before");

        let mods = ledger.compute(&snapshot(&[("/proj/a.txt", "after")]));
        assert_eq!(mods.paths().collect::<Vec<_>>(), vec!["/proj/a.txt"]);
        let entry = mods.get("/proj/a.txt").unwrap();
        assert_eq!(entry.original, "before");
        assert_eq!(entry.current, "after");
    }

    #[test]
    fn test_compute_skips_removed_and_directories() {
        let mut ledger = ModificationLedger::new();
        ledger.record("/proj/gone.txt", "x");
        ledger.record("/proj/dir", "y");

        let mut files = FileMap::new();
        files.insert("/proj/dir".into(), Dirent::Directory);

        assert!(ledger.compute(&files).is_empty());
    }

    #[test]
    fn test_patch_none_when_reverted() {
        let modification = FileModification {
            original: "same".into(),
            current: "same".into(),
        };
        assert_eq!(modification.patch("/a"), None);
    }

    #[test]
    fn test_patch_prefers_diff_for_small_edits() {
        let original: String = (1..=40).map(|i| format!("line {i}\n")).collect();
        let current = original.replace("line 20\n", "line twenty\n");
        let modification = FileModification { original, current };

        match modification.patch("/proj/big.txt") {
            Some(ModificationPatch::Diff(diff)) => {
                assert!(diff.contains("-line 20"));
                assert!(diff.contains("+line twenty"));
            }
            other => panic!("expected diff, got {other:?}"),
        }
    }

    #[test]
    fn test_patch_prefers_file_when_diff_is_longer() {
        let modification = FileModification {
            original: "a".into(),
            current: "b".into(),
        };
        assert_eq!(
            modification.patch("/proj/a.txt"),
            Some(ModificationPatch::File("b".into()))
        );
    }

    #[test]
    fn test_patch_trailing_newline_only_sends_file() {
        let modification = FileModification {
            original: "a".into(),
            current: "a\n".into(),
        };
        assert_eq!(
            modification.patch("/proj/a.txt"),
            Some(ModificationPatch::File("a\n".into()))
        );
    }

    #[test]
    fn test_message_rendering() {
        let mut ledger = ModificationLedger::new();
        ledger.record("/proj/a.txt", "a");
        ledger.record("/proj/same.txt", "s");

        let mods = ledger.compute(&snapshot(&[("/proj/a.txt", "b"), ("/proj/same.txt", "s")]));
        let message = mods.to_message().unwrap();

        assert!(message.starts_with("<file_modifications>\n"));
        assert!(message.contains("<file path=\"/proj/a.txt\">\nb\n</file>"));
        assert!(!message.contains("same.txt"));
        assert!(message.ends_with("</file_modifications>"));
    }

    #[test]
    fn test_message_none_when_nothing_changed() {
        let mut ledger = ModificationLedger::new();
        ledger.record("/proj/a.txt", "a");
        let mods = ledger.compute(&snapshot(&[("/proj/a.txt", "a")]));
        assert_eq!(mods.to_message(), None);
    }
}
