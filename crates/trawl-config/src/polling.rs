//! Task status polling policy.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default delay between polls of one task, in seconds.
const fn default_interval_secs() -> u64 {
    5
}

/// Consecutive failed polls before a task is flagged unreachable.
const fn default_max_consecutive_failures() -> u32 {
    5
}

const fn default_fetch_partial_results() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollingConfig {
    /// Delay between status polls of a single task. Three to five seconds
    /// keeps the dashboard fresh without hammering the backend.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Consecutive retryable failures before the task is flagged unreachable.
    /// Polling continues after the flag is set.
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,

    /// Pull results while a task is still running whenever its result count
    /// grows, instead of only after completion.
    #[serde(default = "default_fetch_partial_results")]
    pub fetch_partial_results: bool,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            max_consecutive_failures: default_max_consecutive_failures(),
            fetch_partial_results: default_fetch_partial_results(),
        }
    }
}

impl PollingConfig {
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}
