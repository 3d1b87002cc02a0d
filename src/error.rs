//! Errors returned by store operations.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when saving a file through the store.
///
/// None of these leave a partial update behind: on error the snapshot and the
/// modification ledger are exactly as they were before the call.
#[derive(Error, Debug)]
pub enum SaveError {
    /// The path is the working root itself or lies outside it
    #[error("EINVAL: invalid file path, write '{path}'")]
    InvalidPath { path: String },

    /// The snapshot has no file at this path, so it disagrees with the
    /// provider's filesystem
    #[error("expected file content to be defined for '{path}'")]
    InternalConsistency { path: String },

    #[error("failed to write '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("write to '{path}' timed out after {timeout:?}")]
    WriteTimeout { path: String, timeout: Duration },
}

impl SaveError {
    /// Whether retrying the same save could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, SaveError::Write { .. } | SaveError::WriteTimeout { .. })
    }

    /// The path the failed save targeted
    pub fn path(&self) -> &str {
        match self {
            SaveError::InvalidPath { path }
            | SaveError::InternalConsistency { path }
            | SaveError::Write { path, .. }
            | SaveError::WriteTimeout { path, .. } => path,
        }
    }
}
