// Filesystem provider layer for the mirrored container filesystem
//
// The store talks to the real filesystem only through `FsProvider`: one
// write primitive and one change-event subscription.

pub mod memory;
pub mod provider;
pub mod slow;

pub use memory::MemoryProvider;
pub use provider::{FsProvider, WatchOptions, WatchSink, WatchStream};
pub use slow::{ProviderMetrics, SlowFsConfig, SlowProvider};
