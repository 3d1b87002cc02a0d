//! Warning capture layer for tracing
//!
//! Collects WARN and ERROR events (malformed payloads, unknown event kinds,
//! failed saves) so a front end can surface them without scraping the log.
//! Repeats of the same message within a short window are folded into one
//! record.

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::Level;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

/// Suppression state for repeated messages
struct DeduplicationState {
    /// Message hash -> (last seen, times seen in the current window)
    recent_messages: HashMap<u64, (Instant, usize)>,
    window: Duration,
    max_entries: usize,
}

impl DeduplicationState {
    fn new(window: Duration) -> Self {
        Self {
            recent_messages: HashMap::new(),
            window,
            max_entries: 100,
        }
    }

    /// Returns `(should_record, suppressed_count)`. `suppressed_count` is the
    /// number of repeats folded since the message was last recorded.
    fn check_message(&mut self, message: &str, now: Instant) -> (bool, usize) {
        let mut hasher = DefaultHasher::new();
        message.hash(&mut hasher);
        let hash = hasher.finish();

        if self.recent_messages.len() > self.max_entries {
            let window = self.window;
            self.recent_messages
                .retain(|_, (seen, _)| now.duration_since(*seen) < window * 2);
        }

        match self.recent_messages.get_mut(&hash) {
            Some((last_seen, count)) if now.duration_since(*last_seen) < self.window => {
                *count += 1;
                *last_seen = now;
                (false, 0)
            }
            Some((last_seen, count)) => {
                let suppressed = count.saturating_sub(1);
                *count = 1;
                *last_seen = now;
                (true, suppressed)
            }
            None => {
                self.recent_messages.insert(hash, (now, 1));
                (true, 0)
            }
        }
    }
}

/// One captured warning or error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarningRecord {
    pub level: Level,
    pub target: String,
    pub message: String,
    /// Repeats folded into this record before it was emitted
    pub suppressed: usize,
}

impl std::fmt::Display for WarningRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}: {}", self.level, self.target, self.message)?;
        if self.suppressed > 0 {
            write!(f, " (suppressed {} similar messages)", self.suppressed)?;
        }
        Ok(())
    }
}

type RecordList = Arc<Mutex<Vec<WarningRecord>>>;

fn lock_records(records: &RecordList) -> MutexGuard<'_, Vec<WarningRecord>> {
    records.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A tracing layer that keeps WARN+ events and notifies via channel
pub struct WarningLogLayer {
    records: RecordList,
    sender: mpsc::Sender<()>,
    dedup: Mutex<DeduplicationState>,
}

/// Read side of a [`WarningLogLayer`]
pub struct WarningLogHandle {
    /// Notified once per recorded warning
    pub receiver: mpsc::Receiver<()>,
    records: RecordList,
}

impl WarningLogHandle {
    /// All warnings recorded so far
    pub fn records(&self) -> Vec<WarningRecord> {
        lock_records(&self.records).clone()
    }

    /// Take the recorded warnings, leaving the list empty
    pub fn drain(&self) -> Vec<WarningRecord> {
        std::mem::take(&mut *lock_records(&self.records))
    }

    pub fn count(&self) -> usize {
        lock_records(&self.records).len()
    }
}

/// Create a warning layer and its handle, folding repeats within 5 seconds
pub fn create() -> (WarningLogLayer, WarningLogHandle) {
    create_with_window(Duration::from_secs(5))
}

/// Create a warning layer with a specific deduplication window
pub fn create_with_window(window: Duration) -> (WarningLogLayer, WarningLogHandle) {
    let (sender, receiver) = mpsc::channel();
    let records = RecordList::default();

    let layer = WarningLogLayer {
        records: Arc::clone(&records),
        sender,
        dedup: Mutex::new(DeduplicationState::new(window)),
    };

    (layer, WarningLogHandle { receiver, records })
}

impl<S> Layer<S> for WarningLogLayer
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let level = *event.metadata().level();
        if level > Level::WARN {
            return;
        }

        let mut visitor = StringVisitor::default();
        event.record(&mut visitor);

        let (should_record, suppressed) = self
            .dedup
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .check_message(&visitor.0, Instant::now());
        if !should_record {
            return;
        }

        lock_records(&self.records).push(WarningRecord {
            level,
            target: event.metadata().target().to_string(),
            message: visitor.0,
            suppressed,
        });

        let _ = self.sender.send(());
    }
}

/// Collects the message and fields of an event into one line
#[derive(Default)]
struct StringVisitor(String);

impl StringVisitor {
    fn push_field(&mut self, name: &str, value: std::fmt::Arguments<'_>) {
        if name == "message" {
            self.0 = value.to_string();
        } else if self.0.is_empty() {
            self.0 = format!("{name}={value}");
        } else {
            self.0.push_str(&format!(" {name}={value}"));
        }
    }
}

impl tracing::field::Visit for StringVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.push_field(field.name(), format_args!("{value:?}"));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.push_field(field.name(), format_args!("{value}"));
    }
}
