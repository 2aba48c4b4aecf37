//! In-memory authoritative cache of tracked tasks.
//!
//! The map is guarded by an `RwLock` held only for lookups and inserts; each
//! task sits behind its own `Mutex`, so reconciles of one task are
//! serialized while different tasks proceed independently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use trawl_core::entities::Task;
use trawl_core::request::TaskRequest;
use trawl_core::snapshot::{RemoteTask, TaskHandle, TaskSnapshot};

use crate::error::{ConsistencyError, EngineError};
use crate::reconcile::{self, ReconcileOutcome};

/// A task plus the local-only polling health that goes with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskRecord {
    #[serde(flatten)]
    pub task: Task,
    /// Set after too many consecutive failed polls, or when the backend no
    /// longer knows the task. Cleared by the next successful poll.
    pub unreachable: bool,
    #[serde(skip)]
    pub consecutive_failures: u32,
}

/// Result of [`TaskStore::adopt`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Adopted {
    Inserted(Task),
    Reconciled(ReconcileOutcome),
}

#[derive(Debug, Default)]
struct Inner {
    order: Vec<String>,
    entries: HashMap<String, Arc<Mutex<TaskRecord>>>,
}

/// Thread-safe task cache.
#[derive(Debug)]
pub struct TaskStore {
    inner: RwLock<Inner>,
    failure_threshold: u32,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new(5)
    }
}

impl TaskStore {
    /// An empty store that flags a task unreachable after
    /// `failure_threshold` consecutive failed polls.
    #[must_use]
    pub fn new(failure_threshold: u32) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            failure_threshold: failure_threshold.max(1),
        }
    }

    /// Register a freshly accepted job in `pending` with no results.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ValidationRejected`] if the request has no
    /// platform or a zero `max_results`, and
    /// [`ConsistencyError::DuplicateTask`] if the id is already tracked.
    pub fn create_task(
        &self,
        handle: &TaskHandle,
        request: TaskRequest,
        created_at: DateTime<Utc>,
    ) -> Result<Task, EngineError> {
        request.validate_scope()?;
        let task = Task::pending(handle.task_id.clone(), request, created_at);

        let mut inner = self.write();
        if inner.entries.contains_key(&task.id) {
            return Err(ConsistencyError::DuplicateTask(task.id).into());
        }
        inner.order.push(task.id.clone());
        inner.entries.insert(
            task.id.clone(),
            Arc::new(Mutex::new(TaskRecord {
                task: task.clone(),
                unreachable: false,
                consecutive_failures: 0,
            })),
        );
        tracing::info!(task_id = %task.id, platforms = task.platforms.len(), "task created");
        Ok(task)
    }

    /// Merge a backend status snapshot into the local task.
    ///
    /// Leaves the failure counter and the unreachable flag alone: only a
    /// fully successful poll clears them, see
    /// [`record_poll_success`](Self::record_poll_success).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::TaskNotFound`] for an untracked id.
    pub fn reconcile(
        &self,
        snapshot: &TaskSnapshot,
        now: DateTime<Utc>,
    ) -> Result<ReconcileOutcome, EngineError> {
        let entry = self.entry(&snapshot.task_id)?;
        let mut record = lock(&entry);

        let outcome = reconcile::merge(&mut record.task, snapshot, now);

        if outcome.stale {
            tracing::debug!(
                task_id = %snapshot.task_id,
                local = %record.task.status,
                reported = %snapshot.status,
                "ignoring stale snapshot"
            );
        } else if outcome.status_changed {
            tracing::info!(task_id = %snapshot.task_id, status = %outcome.status, "task status changed");
        }
        Ok(outcome)
    }

    /// Reset the failure counter after a poll whose status and results
    /// calls both succeeded. Returns `true` when this cleared the
    /// unreachable flag.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::TaskNotFound`] for an untracked id.
    pub fn record_poll_success(&self, task_id: &str) -> Result<bool, EngineError> {
        let entry = self.entry(task_id)?;
        let mut record = lock(&entry);
        let recovered = record.unreachable;
        record.unreachable = false;
        record.consecutive_failures = 0;
        if recovered {
            tracing::info!(task_id, "task reachable again");
        }
        Ok(recovered)
    }

    /// Count a failed poll. Returns `true` when this failure flipped the
    /// task to unreachable.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::TaskNotFound`] for an untracked id.
    pub fn record_poll_failure(&self, task_id: &str) -> Result<bool, EngineError> {
        let entry = self.entry(task_id)?;
        let mut record = lock(&entry);
        record.consecutive_failures = record.consecutive_failures.saturating_add(1);
        if !record.unreachable && record.consecutive_failures >= self.failure_threshold {
            record.unreachable = true;
            tracing::warn!(
                task_id,
                failures = record.consecutive_failures,
                "task flagged unreachable"
            );
            return Ok(true);
        }
        Ok(false)
    }

    /// Flag a task unreachable immediately. Returns `true` if the flag was
    /// not already set.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::TaskNotFound`] for an untracked id.
    pub fn mark_unreachable(&self, task_id: &str) -> Result<bool, EngineError> {
        let entry = self.entry(task_id)?;
        let mut record = lock(&entry);
        let flipped = !record.unreachable;
        record.unreachable = true;
        Ok(flipped)
    }

    /// Insert a task learned from the backend listing, or reconcile it if
    /// already tracked.
    ///
    /// # Errors
    ///
    /// Propagates reconcile errors; in practice none for a tracked id.
    pub fn adopt(
        &self,
        remote: RemoteTask,
        fallback_max_results: u32,
        now: DateTime<Utc>,
    ) -> Result<Adopted, EngineError> {
        if self.contains(&remote.id) {
            return self.reconcile(&remote.snapshot(), now).map(Adopted::Reconciled);
        }

        let task = remote.into_task(fallback_max_results, now);
        let mut inner = self.write();
        // Lost a race with a concurrent insert; the existing entry wins.
        let existing = inner.entries.get(&task.id).cloned();
        if let Some(entry) = existing {
            drop(inner);
            let snapshot = TaskSnapshot {
                task_id: task.id.clone(),
                status: task.status,
                actual_results: task.actual_results,
                completed_at: task.completed_at,
            };
            let mut record = lock(&entry);
            return Ok(Adopted::Reconciled(reconcile::merge(
                &mut record.task,
                &snapshot,
                now,
            )));
        }
        inner.order.push(task.id.clone());
        inner.entries.insert(
            task.id.clone(),
            Arc::new(Mutex::new(TaskRecord {
                task: task.clone(),
                unreachable: false,
                consecutive_failures: 0,
            })),
        );
        tracing::info!(task_id = %task.id, status = %task.status, "adopted task from listing");
        Ok(Adopted::Inserted(task))
    }

    /// Drop a task the backend no longer reports.
    pub fn remove(&self, task_id: &str) -> Option<Task> {
        let mut inner = self.write();
        let entry = inner.entries.remove(task_id)?;
        inner.order.retain(|id| id != task_id);
        drop(inner);
        let task = lock(&entry).task.clone();
        Some(task)
    }

    #[must_use]
    pub fn get(&self, task_id: &str) -> Option<TaskRecord> {
        let entry = self.read().entries.get(task_id).cloned()?;
        let record = lock(&entry).clone();
        Some(record)
    }

    #[must_use]
    pub fn contains(&self, task_id: &str) -> bool {
        self.read().entries.contains_key(task_id)
    }

    /// Every tracked task, in insertion order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<TaskRecord> {
        let entries: Vec<_> = {
            let inner = self.read();
            inner
                .order
                .iter()
                .filter_map(|id| inner.entries.get(id).cloned())
                .collect()
        };
        entries.iter().map(|entry| lock(entry).clone()).collect()
    }

    /// Ids of tasks that still need polling, in insertion order.
    #[must_use]
    pub fn non_terminal_ids(&self) -> Vec<String> {
        self.snapshot()
            .into_iter()
            .filter(|record| !record.task.is_terminal())
            .map(|record| record.task.id)
            .collect()
    }

    /// Ids of every tracked task, in insertion order.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.read().order.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read().order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut inner = self.write();
        inner.order.clear();
        inner.entries.clear();
    }

    #[must_use]
    pub const fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }

    // --- Private helpers ---

    fn entry(&self, task_id: &str) -> Result<Arc<Mutex<TaskRecord>>, EngineError> {
        self.read()
            .entries
            .get(task_id)
            .cloned()
            .ok_or_else(|| EngineError::TaskNotFound(task_id.to_string()))
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn lock(entry: &Mutex<TaskRecord>) -> std::sync::MutexGuard<'_, TaskRecord> {
    entry.lock().unwrap_or_else(PoisonError::into_inner)
}
