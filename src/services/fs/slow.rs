//! Slow filesystem provider for testing
//!
//! This module provides a decorator around any FsProvider that adds a
//! configurable delay to writes. It is used to exercise the store's write
//! timeout and the staleness window while a save is in flight.

use super::provider::{FsProvider, WatchOptions, WatchStream};
use async_trait::async_trait;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Configuration for slow provider simulation
#[derive(Debug, Clone)]
pub struct SlowFsConfig {
    /// Delay before each write_file is forwarded
    pub write_delay: Duration,
}

impl SlowFsConfig {
    /// Create a config with the given write delay
    pub fn uniform(delay: Duration) -> Self {
        Self { write_delay: delay }
    }

    /// Create a config with no delays (useful as a baseline)
    pub fn none() -> Self {
        Self::uniform(Duration::ZERO)
    }
}

impl Default for SlowFsConfig {
    fn default() -> Self {
        Self::none()
    }
}

/// Metrics tracking for provider operations
#[derive(Debug, Clone, Default)]
pub struct ProviderMetrics {
    /// Number of write_file calls started
    pub write_calls: usize,
    /// Number of write_file calls that reached the inner provider
    pub completed_writes: usize,
    /// Number of watch calls
    pub watch_calls: usize,
    /// Total time spent in artificial delays
    pub total_delay_time: Duration,
}

impl ProviderMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all metrics to zero
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Get total number of provider calls
    pub fn total_calls(&self) -> usize {
        self.write_calls + self.watch_calls
    }
}

/// Slow provider wrapper for testing
///
/// Wraps any FsProvider implementation, delays every write and tracks how
/// many operations were made.
pub struct SlowProvider {
    inner: Arc<dyn FsProvider>,
    config: SlowFsConfig,
    metrics: Mutex<ProviderMetrics>,
}

impl SlowProvider {
    pub fn new(inner: Arc<dyn FsProvider>, config: SlowFsConfig) -> Self {
        Self {
            inner,
            config,
            metrics: Mutex::new(ProviderMetrics::new()),
        }
    }

    /// Create with a fixed write delay
    pub fn with_write_delay(inner: Arc<dyn FsProvider>, delay: Duration) -> Self {
        Self::new(inner, SlowFsConfig::uniform(delay))
    }

    /// Get a snapshot of current metrics
    pub async fn metrics(&self) -> ProviderMetrics {
        self.metrics.lock().await.clone()
    }

    pub async fn reset_metrics(&self) {
        self.metrics.lock().await.reset();
    }

    async fn add_delay(&self, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
            self.metrics.lock().await.total_delay_time += delay;
        }
    }
}

#[async_trait]
impl FsProvider for SlowProvider {
    async fn write_file(&self, relative_path: &str, content: &str) -> io::Result<()> {
        self.metrics.lock().await.write_calls += 1;
        self.add_delay(self.config.write_delay).await;
        self.metrics.lock().await.completed_writes += 1;
        self.inner.write_file(relative_path, content).await
    }

    fn watch(&self, options: &WatchOptions) -> io::Result<WatchStream> {
        // try_lock: watch is sync and the metrics lock is never held long
        if let Ok(mut metrics) = self.metrics.try_lock() {
            metrics.watch_calls += 1;
        }
        self.inner.watch(options)
    }
}
