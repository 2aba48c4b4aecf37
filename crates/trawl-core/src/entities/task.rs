use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{Platform, TaskStatus};
use crate::request::TaskRequest;

/// A collection job submitted to the backend.
///
/// Invariants held by every constructor and by the task store merge:
/// `actual_results <= max_results`, and `completed_at.is_some()` exactly when
/// `status.is_terminal()`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub query: String,
    pub platforms: BTreeSet<Platform>,
    pub max_results: u32,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub actual_results: u32,
}

impl Task {
    /// A freshly submitted task, before the backend has reported progress.
    #[must_use]
    pub fn pending(id: impl Into<String>, request: TaskRequest, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            query: request.query,
            platforms: request.platforms,
            max_results: request.max_results,
            status: TaskStatus::Pending,
            created_at,
            completed_at: None,
            actual_results: 0,
        }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    #[must_use]
    pub fn covers(&self, platform: Platform) -> bool {
        self.platforms.contains(&platform)
    }
}
