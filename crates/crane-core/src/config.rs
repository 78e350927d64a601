//! Configuration types for the reconciler and the worker pool

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Reconciler loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Run the periodic reconciler at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Seconds between passes
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_interval_secs() -> u64 {
    30
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            interval_secs: default_interval_secs(),
        }
    }
}

impl ReconcilerConfig {
    /// Pass interval, never zero
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

/// Worker pool settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Number of concurrent workers
    #[serde(default = "default_count")]
    pub count: usize,
    /// Initial delay before polling again after an empty queue
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Cap for the idle backoff
    #[serde(default = "default_max_poll_interval_ms")]
    pub max_poll_interval_ms: u64,
    /// Running records older than this are failed at startup
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
}

fn default_count() -> usize {
    2
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_max_poll_interval_ms() -> u64 {
    10_000
}

fn default_stale_after_secs() -> u64 {
    900
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            count: default_count(),
            poll_interval_ms: default_poll_interval_ms(),
            max_poll_interval_ms: default_max_poll_interval_ms(),
            stale_after_secs: default_stale_after_secs(),
        }
    }
}

impl WorkerConfig {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Never below `poll_interval`
    #[must_use]
    pub fn max_poll_interval(&self) -> Duration {
        Duration::from_millis(self.max_poll_interval_ms).max(self.poll_interval())
    }

    #[must_use]
    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }
}
