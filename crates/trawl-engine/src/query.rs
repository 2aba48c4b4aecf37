//! Filtering, search, grouping and stats over store snapshots.
//!
//! Everything here is a pure function of its inputs.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use trawl_core::CoreError;
use trawl_core::entities::ScrapeResult;
use trawl_core::enums::{Platform, TaskStatus};

use crate::task_store::TaskRecord;

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Platform selector: one platform, or every platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlatformFilter {
    #[default]
    All,
    Only(Platform),
}

impl PlatformFilter {
    #[must_use]
    pub fn matches(self, platform: Platform) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == platform,
        }
    }
}

impl FromStr for PlatformFilter {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        Platform::from_str(s).map(Self::Only)
    }
}

impl fmt::Display for PlatformFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(platform) => fmt::Display::fmt(platform, f),
        }
    }
}

/// Result view selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultFilter {
    /// Case-insensitive substring matched against name and description.
    /// Empty matches everything.
    pub search: String,
    pub platform: PlatformFilter,
}

impl ResultFilter {
    #[must_use]
    pub fn new(search: impl Into<String>, platform: PlatformFilter) -> Self {
        Self {
            search: search.into(),
            platform,
        }
    }

    #[must_use]
    pub fn matches(&self, result: &ScrapeResult) -> bool {
        self.platform.matches(result.platform())
            && matches_search(&self.search.to_lowercase(), result)
    }

    /// Apply the filter, keeping input order.
    #[must_use]
    pub fn apply(&self, results: &[ScrapeResult]) -> Vec<ScrapeResult> {
        let needle = self.search.to_lowercase();
        results
            .iter()
            .filter(|r| self.platform.matches(r.platform()) && matches_search(&needle, r))
            .cloned()
            .collect()
    }
}

fn matches_search(needle: &str, result: &ScrapeResult) -> bool {
    needle.is_empty()
        || result.business_name.to_lowercase().contains(needle)
        || result.description.to_lowercase().contains(needle)
}

/// Results of one platform.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformGroup {
    pub platform: Platform,
    pub results: Vec<ScrapeResult>,
}

/// Partition by platform. Groups appear in order of first occurrence and
/// keep input order inside each group.
#[must_use]
pub fn group_by_platform(results: &[ScrapeResult]) -> Vec<PlatformGroup> {
    let mut groups: Vec<PlatformGroup> = Vec::new();
    for result in results {
        let platform = result.platform();
        match groups.iter_mut().find(|g| g.platform == platform) {
            Some(group) => group.results.push(result.clone()),
            None => groups.push(PlatformGroup {
                platform,
                results: vec![result.clone()],
            }),
        }
    }
    groups
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(TaskStatus),
}

impl StatusFilter {
    #[must_use]
    pub fn matches(self, status: TaskStatus) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        TaskStatus::from_str(s).map(Self::Only)
    }
}

/// Task list selection: substring on query or id, plus a status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub search: String,
    pub status: StatusFilter,
}

impl TaskFilter {
    #[must_use]
    pub fn apply(&self, records: &[TaskRecord]) -> Vec<TaskRecord> {
        let needle = self.search.to_lowercase();
        records
            .iter()
            .filter(|r| {
                self.status.matches(r.task.status)
                    && (needle.is_empty()
                        || r.task.query.to_lowercase().contains(&needle)
                        || r.task.id.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect()
    }
}

/// Task list header counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskStats {
    pub total: usize,
    pub pending: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub unreachable: usize,
    pub total_results: u64,
}

impl TaskStats {
    #[must_use]
    pub fn from_records(records: &[TaskRecord]) -> Self {
        records.iter().fold(Self::default(), |mut stats, record| {
            stats.total += 1;
            match record.task.status {
                TaskStatus::Pending => stats.pending += 1,
                TaskStatus::Running => stats.running += 1,
                TaskStatus::Completed => stats.completed += 1,
                TaskStatus::Failed => stats.failed += 1,
                TaskStatus::Cancelled => stats.cancelled += 1,
            }
            if record.unreachable {
                stats.unreachable += 1;
            }
            stats.total_results += u64::from(record.task.actual_results);
            stats
        })
    }

    /// Tasks still being polled.
    #[must_use]
    pub const fn active(&self) -> usize {
        self.pending + self.running
    }
}
