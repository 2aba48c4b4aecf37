//! Per-task cache of collected results.
//!
//! Results are append-only and deduplicated by id within their task. Every
//! stored record gets a global sequence number so the cross-task view can be
//! returned in arrival order.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde::Serialize;
use trawl_core::entities::ScrapeResult;

use crate::error::{ConsistencyError, EngineError};
use crate::task_store::TaskStore;

/// What one [`ResultStore::append_results`] call did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppendReport {
    pub appended: usize,
    /// Records whose id was already stored for the task.
    pub duplicates: usize,
    /// Records dropped because they contradict the owning task.
    #[serde(skip)]
    pub rejected: Vec<ConsistencyError>,
}

#[derive(Debug, Default)]
struct TaskResults {
    ids: HashSet<String>,
    items: Vec<(u64, ScrapeResult)>,
}

/// Thread-safe result cache.
#[derive(Debug, Default)]
pub struct ResultStore {
    inner: RwLock<HashMap<String, Arc<Mutex<TaskResults>>>>,
    sequence: AtomicU64,
}

impl ResultStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a batch of results for `task_id`, skipping ids already stored.
    ///
    /// Records owned by another task or collected from a platform the task
    /// does not cover are dropped and reported in
    /// [`AppendReport::rejected`].
    ///
    /// # Errors
    ///
    /// Returns [`ConsistencyError::UnknownTask`] when `task_id` is not in
    /// `tasks`; nothing is stored in that case.
    pub fn append_results(
        &self,
        tasks: &TaskStore,
        task_id: &str,
        results: Vec<ScrapeResult>,
    ) -> Result<AppendReport, EngineError> {
        let Some(owner) = tasks.get(task_id) else {
            tracing::warn!(task_id, count = results.len(), "dropping results for unknown task");
            return Err(ConsistencyError::UnknownTask(task_id.to_string()).into());
        };

        let entry = self.entry_or_insert(task_id);
        let mut set = entry.lock().unwrap_or_else(PoisonError::into_inner);
        let mut report = AppendReport::default();

        for result in results {
            if result.task_id != task_id {
                let error = ConsistencyError::ForeignTask {
                    result_id: result.id,
                    expected: task_id.to_string(),
                    actual: result.task_id,
                };
                tracing::warn!(%error, "dropping result");
                report.rejected.push(error);
                continue;
            }
            if !owner.task.covers(result.platform()) {
                let error = ConsistencyError::ForeignPlatform {
                    result_id: result.id.clone(),
                    task_id: task_id.to_string(),
                    platform: result.platform(),
                };
                tracing::warn!(%error, "dropping result");
                report.rejected.push(error);
                continue;
            }
            if !set.ids.insert(result.id.clone()) {
                report.duplicates += 1;
                continue;
            }
            let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
            set.items.push((seq, result));
            report.appended += 1;
        }

        if report.appended > 0 {
            tracing::debug!(
                task_id,
                appended = report.appended,
                duplicates = report.duplicates,
                total = set.items.len(),
                "results appended"
            );
        }
        Ok(report)
    }

    /// Results of one task, in insertion order.
    #[must_use]
    pub fn results_for(&self, task_id: &str) -> Vec<ScrapeResult> {
        self.get_entry(task_id).map_or_else(Vec::new, |entry| {
            lock(&entry)
                .items
                .iter()
                .map(|(_, result)| result.clone())
                .collect()
        })
    }

    /// Every stored result across all tasks, in global insertion order.
    #[must_use]
    pub fn all_results(&self) -> Vec<ScrapeResult> {
        let entries: Vec<_> = self
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();

        let mut items: Vec<(u64, ScrapeResult)> = entries
            .iter()
            .flat_map(|entry| lock(entry).items.clone())
            .collect();
        items.sort_by_key(|(seq, _)| *seq);
        items.into_iter().map(|(_, result)| result).collect()
    }

    #[must_use]
    pub fn count_for(&self, task_id: &str) -> usize {
        self.get_entry(task_id)
            .map_or(0, |entry| lock(&entry).items.len())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        let entries: Vec<_> = self
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        entries.iter().map(|entry| lock(entry).items.len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget every result of a task. Returns how many were dropped.
    pub fn remove_task(&self, task_id: &str) -> usize {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(task_id)
            .map_or(0, |entry| lock(&entry).items.len())
    }

    pub fn clear(&self) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    // --- Private helpers ---

    fn get_entry(&self, task_id: &str) -> Option<Arc<Mutex<TaskResults>>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(task_id)
            .cloned()
    }

    fn entry_or_insert(&self, task_id: &str) -> Arc<Mutex<TaskResults>> {
        if let Some(entry) = self.get_entry(task_id) {
            return entry;
        }
        Arc::clone(
            self.inner
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(task_id.to_string())
                .or_default(),
        )
    }
}

fn lock(entry: &Mutex<TaskResults>) -> std::sync::MutexGuard<'_, TaskResults> {
    entry.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use trawl_core::entities::PlatformMetrics;
    use trawl_core::enums::{Platform, TaskStatus};
    use trawl_core::request::TaskRequest;
    use trawl_core::snapshot::TaskHandle;

    fn tasks_with(ids: &[(&str, &[Platform])]) -> TaskStore {
        let store = TaskStore::default();
        for (id, platforms) in ids {
            let handle = TaskHandle {
                task_id: (*id).into(),
                status: TaskStatus::Pending,
            };
            let request = TaskRequest::new("q", platforms.iter().copied(), 25);
            store.create_task(&handle, request, Utc::now()).unwrap();
        }
        store
    }

    fn result(id: &str, task_id: &str, platform: Platform) -> ScrapeResult {
        ScrapeResult {
            id: id.into(),
            task_id: task_id.into(),
            business_name: format!("Business {id}"),
            description: String::new(),
            phone: None,
            website: None,
            address: None,
            metrics: PlatformMetrics::empty(platform),
        }
    }

    #[test]
    fn duplicate_ids_are_stored_once() {
        let tasks = tasks_with(&[("task_001", &[Platform::Google])]);
        let store = ResultStore::new();

        let report = store
            .append_results(
                &tasks,
                "task_001",
                vec![
                    result("r1", "task_001", Platform::Google),
                    result("r1", "task_001", Platform::Google),
                ],
            )
            .unwrap();
        assert_eq!(report.appended, 1);
        assert_eq!(report.duplicates, 1);

        let again = store
            .append_results(&tasks, "task_001", vec![result("r1", "task_001", Platform::Google)])
            .unwrap();
        assert_eq!(again.appended, 0);
        assert_eq!(store.count_for("task_001"), 1);
    }

    #[test]
    fn unknown_task_fails_whole_batch() {
        let tasks = TaskStore::default();
        let store = ResultStore::new();
        let err = store
            .append_results(&tasks, "ghost", vec![result("r1", "ghost", Platform::Google)])
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Consistency(ConsistencyError::UnknownTask(_))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn foreign_records_are_rejected() {
        let tasks = tasks_with(&[("task_001", &[Platform::Google])]);
        let store = ResultStore::new();

        let report = store
            .append_results(
                &tasks,
                "task_001",
                vec![
                    result("r1", "task_002", Platform::Google),
                    result("r2", "task_001", Platform::Linkedin),
                    result("r3", "task_001", Platform::Google),
                ],
            )
            .unwrap();
        assert_eq!(report.appended, 1);
        assert_eq!(report.rejected.len(), 2);
        assert!(matches!(
            report.rejected[0],
            ConsistencyError::ForeignTask { .. }
        ));
        assert!(matches!(
            report.rejected[1],
            ConsistencyError::ForeignPlatform {
                platform: Platform::Linkedin,
                ..
            }
        ));
    }

    #[test]
    fn all_results_follow_arrival_order_across_tasks() {
        let tasks = tasks_with(&[
            ("task_a", &[Platform::Google]),
            ("task_b", &[Platform::Facebook]),
        ]);
        let store = ResultStore::new();
        store
            .append_results(&tasks, "task_a", vec![result("a1", "task_a", Platform::Google)])
            .unwrap();
        store
            .append_results(&tasks, "task_b", vec![result("b1", "task_b", Platform::Facebook)])
            .unwrap();
        store
            .append_results(&tasks, "task_a", vec![result("a2", "task_a", Platform::Google)])
            .unwrap();

        let ids: Vec<String> = store.all_results().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["a1", "b1", "a2"]);

        assert_eq!(store.remove_task("task_a"), 2);
        assert_eq!(store.len(), 1);
        store.clear();
        assert!(store.results_for("task_b").is_empty());
    }
}
