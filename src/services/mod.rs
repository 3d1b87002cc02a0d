//! Asynchronous services and external integrations
//!
//! Everything that touches the provider, timers or the tracing subscriber
//! lives here; the store composes them.

pub mod content;
pub mod event_buffer;
pub mod fs;
pub mod listeners;
pub mod tracing_setup;
pub mod warning_log;
