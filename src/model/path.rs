//! Path helpers for snapshot keys and working-root checks.
//!
//! Paths here are plain `/`-separated strings, not `std::path::Path`: they
//! name entries inside the container, not on the host.

/// Strip trailing slashes so directory and file paths compare equal
/// regardless of how the provider spelled them.
///
/// # Examples
/// - `/proj/src/` -> `/proj/src`
/// - `/proj//` -> `/proj`
/// - `/proj/a.txt` -> `/proj/a.txt` (unchanged)
pub fn normalize_key(path: &str) -> &str {
    path.trim_end_matches('/')
}

/// Lexically normalize an absolute path: collapse repeated separators,
/// drop `.` segments and resolve `..` against the preceding segment.
///
/// `..` at the top level is dropped, the same way `/..` is `/` on Unix.
pub fn normalize_lexically(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    format!("/{}", segments.join("/"))
}

/// Resolve `path` relative to `root`.
///
/// Returns `None` when `path` is not strictly inside `root` (outside it, or the
/// root itself), which callers treat as an invalid write target.
pub fn relative_to_root(root: &str, path: &str) -> Option<String> {
    if !path.starts_with('/') {
        return None;
    }

    let root = normalize_lexically(root);
    let path = normalize_lexically(path);

    let relative = if root == "/" {
        path.strip_prefix('/')?
    } else {
        path.strip_prefix(root.as_str())?.strip_prefix('/')?
    };

    if relative.is_empty() {
        None
    } else {
        Some(relative.to_string())
    }
}

/// Whether `path` equals `dir` or lives underneath it
pub fn is_within(dir: &str, path: &str) -> bool {
    let dir = normalize_key(dir);
    let path = normalize_key(path);
    path == dir || dir.is_empty() || path.starts_with(&format!("{dir}/"))
}
