//! Tracing subscriber setup
//!
//! Shared between the replay CLI and tests: an `fmt` layer writing to a log
//! file or stderr, `RUST_LOG` filtering and the warning capture layer.

use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use super::warning_log::{self, WarningLogHandle, WarningLogLayer};

/// Initialize the global tracing subscriber.
///
/// Logs go to `log_file_path` when given, stderr otherwise. Filtering follows
/// `RUST_LOG` and defaults to `info`. Returns the handle for warnings
/// captured while the process runs.
pub fn init_global(log_file_path: Option<&Path>) -> io::Result<WarningLogHandle> {
    let writer = match log_file_path {
        Some(path) => BoxMakeWriter::new(Arc::new(File::create(path)?)),
        None => BoxMakeWriter::new(io::stderr),
    };
    let (warning_layer, warning_handle) = warning_log::create();

    build_subscriber(writer, Some(warning_layer))
        .try_init()
        .map_err(io::Error::other)?;

    Ok(warning_handle)
}

/// Build a subscriber writing to `writer` with an optional warning layer
pub fn build_subscriber(
    writer: BoxMakeWriter,
    warning_layer: Option<WarningLogLayer>,
) -> impl tracing::Subscriber + Send + Sync {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer().with_writer(writer).with_ansi(false);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .with(warning_layer)
}
