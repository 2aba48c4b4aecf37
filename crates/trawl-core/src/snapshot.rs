//! Backend-reported state, as handed from the API client to the stores.
//!
//! These are normalized forms of the backend responses: the client maps wire
//! JSON into them, and the task store merges them into its local [`Task`]s.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::{ScrapeResult, Task};
use crate::enums::{Platform, TaskStatus};

/// Acknowledgement returned when a job is accepted.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct TaskHandle {
    pub task_id: String,
    pub status: TaskStatus,
}

/// Point-in-time status of one task as reported by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct TaskSnapshot {
    pub task_id: String,
    pub status: TaskStatus,
    pub actual_results: u32,
    pub completed_at: Option<DateTime<Utc>>,
}

/// The accumulated results the backend holds for one task.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ResultSet {
    pub task_id: String,
    pub results: Vec<ScrapeResult>,
}

/// A task as it appears in the backend's task listing.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct RemoteTask {
    pub id: String,
    pub query: String,
    pub platforms: BTreeSet<Platform>,
    pub status: TaskStatus,
    pub max_results: Option<u32>,
    pub actual_results: u32,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl RemoteTask {
    /// The status portion of this listing entry.
    #[must_use]
    pub fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            task_id: self.id.clone(),
            status: self.status,
            actual_results: self.actual_results,
            completed_at: self.completed_at,
        }
    }

    /// Build a local task from a listing entry, repairing the invariants a
    /// sloppy backend may violate.
    ///
    /// A missing `max_results` falls back to `fallback_max_results` (raised
    /// to `actual_results` if needed); a terminal entry without a completion
    /// time is stamped with `now`; a non-terminal entry loses any completion
    /// time.
    #[must_use]
    pub fn into_task(self, fallback_max_results: u32, now: DateTime<Utc>) -> Task {
        let max_results = self
            .max_results
            .unwrap_or_else(|| fallback_max_results.max(self.actual_results))
            .max(1);
        let completed_at = if self.status.is_terminal() {
            Some(self.completed_at.unwrap_or(now))
        } else {
            None
        };
        Task {
            id: self.id,
            query: self.query,
            platforms: self.platforms,
            max_results,
            status: self.status,
            created_at: self.created_at,
            completed_at,
            actual_results: self.actual_results.min(max_results),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn remote(status: TaskStatus) -> RemoteTask {
        RemoteTask {
            id: "task_002".into(),
            query: "https://business.example.com".into(),
            platforms: [Platform::Linkedin, Platform::Instagram].into_iter().collect(),
            status,
            max_results: Some(25),
            actual_results: 0,
            created_at: Utc.with_ymd_and_hms(2024, 1, 15, 11, 0, 0).unwrap(),
            completed_at: None,
        }
    }

    #[test]
    fn terminal_listing_without_timestamp_is_stamped() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let task = remote(TaskStatus::Failed).into_task(25, now);
        assert_eq!(task.completed_at, Some(now));
    }

    #[test]
    fn running_listing_drops_completion_time() {
        let mut entry = remote(TaskStatus::Running);
        entry.completed_at = Some(Utc::now());
        let task = entry.into_task(25, Utc::now());
        assert!(task.completed_at.is_none());
    }

    #[test]
    fn missing_max_results_never_undercuts_actual() {
        let mut entry = remote(TaskStatus::Running);
        entry.max_results = None;
        entry.actual_results = 40;
        let task = entry.into_task(25, Utc::now());
        assert_eq!(task.max_results, 40);
        assert_eq!(task.actual_results, 40);
    }

    #[test]
    fn actual_results_are_clamped() {
        let mut entry = remote(TaskStatus::Completed);
        entry.actual_results = 30;
        let task = entry.into_task(25, Utc::now());
        assert_eq!(task.actual_results, 25);
    }
}
