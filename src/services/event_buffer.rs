//! Timer-based coalescing of watch events.
//!
//! Providers can emit many small batches during bursts of activity (package
//! installs, scaffolding, formatters). Applying each one separately would
//! notify consumers once per batch. The buffer collects everything that
//! arrives within a fixed window, starting at the first event after the
//! previous flush, and hands it over as one batch.

use crate::model::WatchEvent;
use crate::services::fs::WatchStream;
use std::mem;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};

/// Accumulates events until the window opened by the first one has elapsed
#[derive(Debug)]
pub struct EventBuffer {
    window: Duration,
    pending: Vec<WatchEvent>,
    deadline: Option<Instant>,
}

impl EventBuffer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: Vec::new(),
            deadline: None,
        }
    }

    /// Append a provider batch, keeping arrival order.
    ///
    /// The first batch after a flush starts the window.
    pub fn push(&mut self, batch: Vec<WatchEvent>, now: Instant) {
        if batch.is_empty() {
            return;
        }
        if self.deadline.is_none() {
            self.deadline = Some(now + self.window);
        }
        self.pending.extend(batch);
    }

    /// When the pending events are due, if there are any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Take all pending events and close the window
    pub fn take(&mut self) -> Vec<WatchEvent> {
        self.deadline = None;
        mem::take(&mut self.pending)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Drive `stream` through an [`EventBuffer`], calling `flush` with every
/// coalesced batch.
///
/// Returns once the stream is closed; anything still pending is flushed
/// first.
pub async fn run_buffered<F>(mut stream: WatchStream, window: Duration, mut flush: F)
where
    F: FnMut(Vec<WatchEvent>),
{
    let mut buffer = EventBuffer::new(window);

    loop {
        let deadline = buffer.deadline();

        tokio::select! {
            received = stream.recv() => match received {
                Some(batch) => buffer.push(batch, Instant::now()),
                None => {
                    if !buffer.is_empty() {
                        flush(buffer.take());
                    }
                    break;
                }
            },
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                let events = buffer.take();
                tracing::debug!("Flushing {} buffered watch events", events.len());
                flush(events);
            }
        }
    }
}
