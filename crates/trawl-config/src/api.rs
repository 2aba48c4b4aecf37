//! Job backend connection settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_base_url() -> String {
    "http://localhost:3000/api".to_string()
}

/// Default request timeout in seconds.
const fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    "trawl/0.1".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Base URL of the job backend, without a trailing slash
    /// (e.g., `https://jobs.example.com/api`).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// `User-Agent` header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl ApiConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Base URL with any trailing slash removed.
    #[must_use]
    pub fn normalized_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}
