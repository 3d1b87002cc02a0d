//! Line-based unified diffs for file modifications.
//!
//! Backed by `similar`'s Myers diff, which runs in linear space, so a one
//! line edit to a large lockfile stays cheap to describe.

use similar::{DiffTag, TextDiff};

/// Number of unchanged lines shown around each change
pub const DEFAULT_CONTEXT_LINES: usize = 3;

/// Render a unified diff for one file with the default context.
///
/// Returns an empty string when the contents are identical.
pub fn unified_diff(path: &str, original: &str, current: &str) -> String {
    unified_diff_with_context(path, original, current, DEFAULT_CONTEXT_LINES)
}

/// Render a unified diff with `context` unchanged lines around each change.
///
/// A missing newline at the end of either side is marked with
/// `\ No newline at end of file`, as `diff -u` does.
pub fn unified_diff_with_context(
    path: &str,
    original: &str,
    current: &str,
    context: usize,
) -> String {
    let diff = TextDiff::from_lines(original, current);
    if diff.ops().iter().all(|op| op.tag() == DiffTag::Equal) {
        return String::new();
    }

    diff.unified_diff()
        .context_radius(context)
        .header(path, path)
        .to_string()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Generate a simple multi-line string
    fn multiline_string() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-c ]{0,4}", 0..12).prop_map(|lines| lines.join("\n"))
    }

    /// Lines of one side of a single-hunk diff body
    fn side(diff: &str, skip: char) -> Vec<String> {
        diff.lines()
            .skip(2)
            .filter(|line| !line.starts_with("@@") && !line.starts_with('\\'))
            .filter(|line| !line.starts_with(skip))
            .map(|line| line[1..].to_string())
            .collect()
    }

    proptest! {
        /// Identical content never produces a diff
        #[test]
        fn identical_content_has_no_diff(content in multiline_string()) {
            prop_assert!(unified_diff("/a", &content, &content).is_empty());
        }

        /// With unlimited context the diff replays to both inputs line for line
        #[test]
        fn diff_covers_both_sides(
            original in multiline_string(),
            current in multiline_string()
        ) {
            let diff = unified_diff_with_context("/a", &original, &current, 1_000);
            prop_assume!(!diff.is_empty());

            let original_lines: Vec<String> = original.lines().map(String::from).collect();
            let current_lines: Vec<String> = current.lines().map(String::from).collect();
            prop_assert_eq!(side(&diff, '+'), original_lines);
            prop_assert_eq!(side(&diff, '-'), current_lines);
        }

        /// Any real change yields a diff with the file header
        #[test]
        fn changed_content_has_header(
            original in multiline_string(),
            current in multiline_string()
        ) {
            prop_assume!(original != current);
            let diff = unified_diff("/proj/f", &original, &current);
            prop_assert!(diff.starts_with("--- /proj/f\n+++ /proj/f\n@@ "));
        }
    }
}
