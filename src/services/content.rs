//! Content classification and decoding for file events.
//!
//! The binary check is purely for the editor: it keeps non-text data out of
//! text views. It only looks at a leading sample, so it is not bullet-proof
//! and can report false positives.

use crate::model::FileEntry;
use std::str::Utf8Error;

/// Whether the leading `sample_len` bytes of `buffer` look binary.
///
/// A sample is binary when it contains a NUL or one of the low control codes
/// (0x01..=0x08), or an invalid UTF-8 sequence. A multi-byte character cut in
/// half by the sample boundary does not count.
pub fn is_binary(buffer: &[u8], sample_len: usize) -> bool {
    let sample = &buffer[..buffer.len().min(sample_len)];

    if sample.iter().any(|&b| b <= 0x08) {
        return true;
    }

    match std::str::from_utf8(sample) {
        Ok(_) => false,
        // error_len() is None when the input merely ends mid-character
        Err(e) => e.error_len().is_some(),
    }
}

/// Strictly decode a UTF-8 buffer
pub fn decode_utf8(buffer: &[u8]) -> Result<String, Utf8Error> {
    std::str::from_utf8(buffer).map(str::to_owned)
}

/// Build the snapshot entry for a file event payload.
///
/// Binary payloads keep no content. Text that fails strict decoding becomes
/// an empty file; the failure is logged and never returned, so one malformed
/// payload cannot abort a batch.
pub fn file_entry_from_buffer(path: &str, buffer: Option<&[u8]>, sample_len: usize) -> FileEntry {
    let Some(buffer) = buffer else {
        return FileEntry::text(String::new());
    };

    if is_binary(buffer, sample_len) {
        return FileEntry::binary();
    }

    if buffer.is_empty() {
        return FileEntry::text(String::new());
    }

    match decode_utf8(buffer) {
        Ok(content) => FileEntry::text(content),
        Err(e) => {
            tracing::error!("Failed to decode file content for {}: {}", path, e);
            FileEntry::text(String::new())
        }
    }
}
