//! Per-task polling scheduler.
//!
//! [`Tracker`] owns one poll loop per watched task. Each loop polls status
//! immediately, then every `interval`, pulling results whenever the task
//! reports more than are stored and once more when it reaches a terminal
//! state. A loop ends when its task is terminal and its results are synced,
//! when it is unwatched, when the session expires, or when the task is
//! removed from the store.
//!
//! State changes are broadcast as [`TrackerEvent`]s. Call
//! [`Tracker::subscribe`] to receive them.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use trawl_client::JobBackend;
use trawl_config::{GeneralConfig, PollingConfig};
use trawl_core::entities::Task;
use trawl_core::enums::TaskStatus;
use trawl_core::request::TaskRequest;
use trawl_core::snapshot::TaskSnapshot;

use crate::error::{ConsistencyError, EngineError};
use crate::reconcile::ReconcileOutcome;
use crate::result_store::ResultStore;
use crate::task_store::{Adopted, TaskRecord, TaskStore};

/// Broadcast channel capacity for tracker events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Polling cadence and failure tolerance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_consecutive_failures: u32,
    /// Pull results while a task is still running.
    pub fetch_partial_results: bool,
    /// `max_results` assumed for listing entries that omit it.
    pub fallback_max_results: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from_config(&PollingConfig::default(), &GeneralConfig::default())
    }
}

impl PollPolicy {
    #[must_use]
    pub fn from_config(polling: &PollingConfig, general: &GeneralConfig) -> Self {
        Self {
            interval: polling.interval(),
            max_consecutive_failures: polling.max_consecutive_failures,
            fetch_partial_results: polling.fetch_partial_results,
            fallback_max_results: general.default_max_results,
        }
    }
}

/// Why a poll loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Terminal status reached and results fetched.
    Settled,
    Unwatched,
    SessionExpired,
    /// The task left the store while the loop was running.
    Removed,
}

/// Notifications published by the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TrackerEvent {
    StatusChanged {
        task_id: String,
        status: TaskStatus,
        actual_results: u32,
    },
    ResultsAppended {
        task_id: String,
        appended: usize,
        total: usize,
    },
    Unreachable {
        task_id: String,
    },
    Recovered {
        task_id: String,
    },
    /// The backend no longer knows the task. It stays in the store.
    TaskMissing {
        task_id: String,
    },
    SessionExpired,
    Stopped {
        task_id: String,
        reason: StopReason,
    },
}

/// What one poll step did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollStep {
    pub outcome: ReconcileOutcome,
    /// Results newly stored by this step.
    pub appended: usize,
    /// Terminal and fully synced; no further polling needed.
    pub settled: bool,
}

/// Outcome of [`Tracker::sync_tasks`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub adopted: Vec<String>,
    pub updated: usize,
    pub removed: Vec<String>,
}

struct Poller {
    generation: u64,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct Pollers {
    next_generation: u64,
    active: HashMap<String, Poller>,
}

struct Shared {
    backend: Arc<dyn JobBackend>,
    tasks: Arc<TaskStore>,
    results: Arc<ResultStore>,
    policy: PollPolicy,
    pollers: Mutex<Pollers>,
    events: broadcast::Sender<TrackerEvent>,
    /// Master cancellation token, cancelled during shutdown.
    cancel: CancellationToken,
}

/// Poll scheduler shared by the CLI commands. Cheap to clone.
#[derive(Clone)]
pub struct Tracker {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker")
            .field("policy", &self.shared.policy)
            .field("tasks", &self.shared.tasks.len())
            .field("watching", &self.pollers().active.len())
            .finish_non_exhaustive()
    }
}

impl Tracker {
    #[must_use]
    pub fn new(
        backend: Arc<dyn JobBackend>,
        tasks: Arc<TaskStore>,
        results: Arc<ResultStore>,
        policy: PollPolicy,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                backend,
                tasks,
                results,
                policy,
                pollers: Mutex::new(Pollers::default()),
                events,
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// A tracker over fresh, empty stores.
    #[must_use]
    pub fn with_backend(backend: Arc<dyn JobBackend>, policy: PollPolicy) -> Self {
        let tasks = Arc::new(TaskStore::new(policy.max_consecutive_failures));
        Self::new(backend, tasks, Arc::new(ResultStore::new()), policy)
    }

    #[must_use]
    pub fn tasks(&self) -> &Arc<TaskStore> {
        &self.shared.tasks
    }

    #[must_use]
    pub fn results(&self) -> &Arc<ResultStore> {
        &self.shared.results
    }

    #[must_use]
    pub fn policy(&self) -> &PollPolicy {
        &self.shared.policy
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TrackerEvent> {
        self.shared.events.subscribe()
    }

    /// Validate, send, register and start watching a new job.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ValidationRejected`] without touching the
    /// network for a blank query, no platform or zero `max_results`.
    /// Backend failures are returned as classified by [`EngineError`].
    pub async fn submit(&self, mut request: TaskRequest) -> Result<Task, EngineError> {
        request.validate()?;
        request.query = request.query.trim().to_string();

        let handle = match self.shared.backend.submit(&request).await {
            Ok(handle) => handle,
            Err(error) => {
                let error = EngineError::from(error);
                if matches!(error, EngineError::SessionExpired) {
                    self.shared.publish(TrackerEvent::SessionExpired);
                }
                return Err(error);
            }
        };
        let task = self
            .shared
            .tasks
            .create_task(&handle, request, Utc::now())?;
        tracing::info!(task_id = %task.id, query = %task.query, "job submitted");
        self.watch(&task.id);
        Ok(task)
    }

    /// Start polling a tracked task. Returns `false` if it is already being
    /// watched, is unknown, or the tracker has shut down.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn watch(&self, task_id: &str) -> bool {
        if self.shared.cancel.is_cancelled() || !self.shared.tasks.contains(task_id) {
            return false;
        }
        let mut pollers = self.pollers();
        if pollers
            .active
            .get(task_id)
            .is_some_and(|p| !p.handle.is_finished())
        {
            return false;
        }

        pollers.next_generation += 1;
        let generation = pollers.next_generation;
        let cancel = self.shared.cancel.child_token();
        let handle = tokio::spawn(run_poller(
            Arc::clone(&self.shared),
            task_id.to_string(),
            cancel.clone(),
            generation,
        ));
        pollers.active.insert(
            task_id.to_string(),
            Poller {
                generation,
                cancel,
                handle,
            },
        );
        tracing::debug!(task_id, "watching task");
        true
    }

    /// Watch every non-terminal task in the store. Returns how many loops
    /// were started.
    pub fn watch_all(&self) -> usize {
        self.shared
            .tasks
            .non_terminal_ids()
            .iter()
            .filter(|id| self.watch(id))
            .count()
    }

    /// Stop polling a task. The task and its results stay in the stores.
    pub fn unwatch(&self, task_id: &str) -> bool {
        let Some(poller) = self.pollers().active.remove(task_id) else {
            return false;
        };
        poller.cancel.cancel();
        self.shared.publish(TrackerEvent::Stopped {
            task_id: task_id.to_string(),
            reason: StopReason::Unwatched,
        });
        true
    }

    #[must_use]
    pub fn is_watching(&self, task_id: &str) -> bool {
        self.pollers()
            .active
            .get(task_id)
            .is_some_and(|p| !p.handle.is_finished())
    }

    #[must_use]
    pub fn watching(&self) -> Vec<String> {
        self.pollers()
            .active
            .iter()
            .filter(|(_, p)| !p.handle.is_finished())
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Poll one task right now, outside its loop. Safe to race with the
    /// scheduled poll: both go through the same monotone merge.
    ///
    /// # Errors
    ///
    /// Returns the classified poll failure. Failures count toward the
    /// unreachable threshold as they would in the loop.
    pub async fn refresh(&self, task_id: &str) -> Result<PollStep, EngineError> {
        if !self.shared.tasks.contains(task_id) {
            return Err(EngineError::TaskNotFound(task_id.to_string()));
        }
        match poll_once(&self.shared, task_id).await {
            Ok(step) => Ok(step),
            Err(error) => {
                self.shared.note_failure(task_id, &error);
                Err(error)
            }
        }
    }

    /// Reconcile the store with the backend task listing: adopt tasks
    /// created elsewhere, update known ones, and drop tasks the backend no
    /// longer reports.
    ///
    /// # Errors
    ///
    /// Returns the classified listing failure; the stores are untouched.
    pub async fn sync_tasks(&self) -> Result<SyncReport, EngineError> {
        let listing = match self.shared.backend.list_tasks().await {
            Ok(listing) => listing,
            Err(error) => {
                let error = EngineError::from(error);
                if matches!(error, EngineError::SessionExpired) {
                    self.shared.publish(TrackerEvent::SessionExpired);
                }
                return Err(error);
            }
        };

        let now = Utc::now();
        let mut report = SyncReport::default();
        let listed: HashSet<String> = listing.iter().map(|remote| remote.id.clone()).collect();

        for remote in listing {
            let task_id = remote.id.clone();
            match self
                .shared
                .tasks
                .adopt(remote, self.shared.policy.fallback_max_results, now)?
            {
                Adopted::Inserted(_) => report.adopted.push(task_id),
                Adopted::Reconciled(outcome) => {
                    if outcome.changed() {
                        report.updated += 1;
                        self.shared.publish_outcome(&task_id, &outcome);
                    }
                }
            }
        }

        for task_id in self.shared.tasks.ids() {
            if listed.contains(&task_id) {
                continue;
            }
            self.unwatch(&task_id);
            self.shared.tasks.remove(&task_id);
            let dropped = self.shared.results.remove_task(&task_id);
            tracing::info!(task_id, dropped_results = dropped, "task removed by backend");
            report.removed.push(task_id);
        }

        tracing::debug!(
            adopted = report.adopted.len(),
            updated = report.updated,
            removed = report.removed.len(),
            "task listing synced"
        );
        Ok(report)
    }

    /// Wait until the task's poll loop has ended and return its final record.
    ///
    /// Returns immediately if the task is not being watched.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::TaskNotFound`] if the task left the store, and
    /// [`EngineError::SessionExpired`] if the loop stopped for that reason.
    pub async fn wait_until_settled(&self, task_id: &str) -> Result<TaskRecord, EngineError> {
        let mut rx = self.subscribe();
        loop {
            if !self.is_watching(task_id) {
                break;
            }
            match rx.recv().await {
                Ok(TrackerEvent::Stopped { task_id: id, reason }) if id == task_id => {
                    if reason == StopReason::SessionExpired {
                        return Err(EngineError::SessionExpired);
                    }
                    break;
                }
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        self.shared
            .tasks
            .get(task_id)
            .ok_or_else(|| EngineError::TaskNotFound(task_id.to_string()))
    }

    /// Stop every poll loop, wait for them to exit, and clear both stores.
    pub async fn shutdown(&self) {
        self.shared.cancel.cancel();
        let pollers: Vec<Poller> = self
            .pollers()
            .active
            .drain()
            .map(|(_, poller)| poller)
            .collect();
        for poller in pollers {
            if let Err(error) = poller.handle.await {
                tracing::warn!(%error, "poll loop ended abnormally");
            }
        }
        self.shared.tasks.clear();
        self.shared.results.clear();
        tracing::debug!("tracker shut down");
    }

    fn pollers(&self) -> MutexGuard<'_, Pollers> {
        self.shared.pollers()
    }
}

impl Shared {
    fn pollers(&self) -> MutexGuard<'_, Pollers> {
        self.pollers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, event: TrackerEvent) {
        // A send error only means nobody is subscribed.
        let _ = self.events.send(event);
    }

    fn publish_outcome(&self, task_id: &str, outcome: &ReconcileOutcome) {
        if outcome.changed() {
            self.publish(TrackerEvent::StatusChanged {
                task_id: task_id.to_string(),
                status: outcome.status,
                actual_results: outcome.actual_results,
            });
        }
    }

    /// Record a failed poll against the task and publish what it caused.
    fn note_failure(&self, task_id: &str, error: &EngineError) {
        match error {
            EngineError::SessionExpired => {
                tracing::warn!(task_id, "session expired while polling");
                self.publish(TrackerEvent::SessionExpired);
            }
            EngineError::TaskNotFound(_) => {
                tracing::warn!(task_id, "backend no longer knows task");
                if matches!(self.tasks.mark_unreachable(task_id), Ok(true)) {
                    self.publish(TrackerEvent::TaskMissing {
                        task_id: task_id.to_string(),
                    });
                }
            }
            _ => {
                tracing::warn!(task_id, %error, retryable = error.is_retryable(), "poll failed");
                if matches!(self.tasks.record_poll_failure(task_id), Ok(true)) {
                    self.publish(TrackerEvent::Unreachable {
                        task_id: task_id.to_string(),
                    });
                }
            }
        }
    }

    fn retire(&self, task_id: &str, generation: u64, reason: StopReason) {
        let mut pollers = self.pollers();
        if pollers
            .active
            .get(task_id)
            .is_some_and(|p| p.generation == generation)
        {
            pollers.active.remove(task_id);
        }
        drop(pollers);
        tracing::debug!(task_id, ?reason, "poll loop stopped");
        self.publish(TrackerEvent::Stopped {
            task_id: task_id.to_string(),
            reason,
        });
    }
}

/// One status poll, plus a results pull when the task has more results than
/// are stored or has just reached a terminal state.
async fn poll_once(shared: &Shared, task_id: &str) -> Result<PollStep, EngineError> {
    let reported = shared.backend.fetch_task_status(task_id).await?;
    if reported.task_id != task_id {
        tracing::warn!(task_id, reported = %reported.task_id, "status response names another task");
    }
    let snapshot = TaskSnapshot {
        task_id: task_id.to_string(),
        ..reported
    };
    let mut outcome = shared.tasks.reconcile(&snapshot, Utc::now())?;
    shared.publish_outcome(task_id, &outcome);

    let terminal = outcome.status.is_terminal();
    let stored = shared.results.count_for(task_id);
    let behind = usize::try_from(outcome.actual_results).unwrap_or(usize::MAX) > stored;
    let wants_results = terminal || (shared.policy.fetch_partial_results && behind);

    let mut appended = 0;
    if wants_results {
        let set = shared.backend.fetch_results(task_id).await?;
        let report = shared
            .results
            .append_results(&shared.tasks, task_id, set.results)?;
        appended = report.appended;
        if appended > 0 {
            shared.publish(TrackerEvent::ResultsAppended {
                task_id: task_id.to_string(),
                appended,
                total: shared.results.count_for(task_id),
            });
        }
    }

    // Only a poll whose status and results calls both went through counts
    // as a success for the unreachable threshold.
    if shared.tasks.record_poll_success(task_id)? {
        outcome.recovered = true;
        shared.publish(TrackerEvent::Recovered {
            task_id: task_id.to_string(),
        });
    }

    Ok(PollStep {
        outcome,
        appended,
        settled: terminal,
    })
}

async fn run_poller(
    shared: Arc<Shared>,
    task_id: String,
    cancel: CancellationToken,
    generation: u64,
) {
    let interval = shared.policy.interval;
    let reason = loop {
        let polled = tokio::select! {
            biased;
            () = cancel.cancelled() => break StopReason::Unwatched,
            polled = poll_once(&shared, &task_id) => polled,
        };

        match polled {
            Ok(step) if step.settled => break StopReason::Settled,
            Ok(_) => {}
            Err(_) if !shared.tasks.contains(&task_id) => break StopReason::Removed,
            Err(EngineError::Consistency(ConsistencyError::UnknownTask(_))) => {
                break StopReason::Removed;
            }
            Err(error) => {
                shared.note_failure(&task_id, &error);
                if matches!(error, EngineError::SessionExpired) {
                    break StopReason::SessionExpired;
                }
            }
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => break StopReason::Unwatched,
            () = tokio::time::sleep(interval) => {}
        }
    };

    // Unwatch already removed the entry and published the stop.
    if reason != StopReason::Unwatched {
        shared.retire(&task_id, generation, reason);
    }
}
