//! Merge of a backend status snapshot into a local task.
//!
//! The merge is monotone: status only moves forward along
//! `pending → running → terminal`, the result count never shrinks, and the
//! completion time is stamped once. Applying the same snapshot twice, or an
//! older one after a newer one, leaves the task unchanged.

use chrono::{DateTime, Utc};
use serde::Serialize;
use trawl_core::entities::Task;
use trawl_core::enums::TaskStatus;
use trawl_core::snapshot::TaskSnapshot;

/// What a reconcile changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    /// Status after the merge.
    pub status: TaskStatus,
    /// Result count after the merge.
    pub actual_results: u32,
    pub status_changed: bool,
    pub results_grew: bool,
    /// This merge moved the task into a terminal state.
    pub became_terminal: bool,
    /// The snapshot was older than local state and was ignored.
    pub stale: bool,
    /// The poll that produced this outcome cleared the unreachable flag.
    /// Never set by [`merge`] itself.
    pub recovered: bool,
}

impl ReconcileOutcome {
    const fn unchanged(task: &Task, stale: bool) -> Self {
        Self {
            status: task.status,
            actual_results: task.actual_results,
            status_changed: false,
            results_grew: false,
            became_terminal: false,
            stale,
            recovered: false,
        }
    }

    #[must_use]
    pub const fn changed(&self) -> bool {
        self.status_changed || self.results_grew
    }
}

/// Apply `snapshot` to `task`. `now` stamps `completed_at` when the backend
/// reports a terminal state without one.
pub fn merge(task: &mut Task, snapshot: &TaskSnapshot, now: DateTime<Utc>) -> ReconcileOutcome {
    if task.is_terminal() {
        return ReconcileOutcome::unchanged(task, snapshot.status != task.status);
    }
    if snapshot.status.stage() < task.status.stage() {
        return ReconcileOutcome::unchanged(task, true);
    }

    let previous_status = task.status;
    let previous_results = task.actual_results;

    if task.status.can_transition_to(snapshot.status) {
        task.status = snapshot.status;
    }

    let reported = snapshot.actual_results.min(task.max_results);
    task.actual_results = task.actual_results.max(reported);

    let became_terminal = !previous_status.is_terminal() && task.status.is_terminal();
    if became_terminal && task.completed_at.is_none() {
        task.completed_at = Some(snapshot.completed_at.unwrap_or(now));
    }

    ReconcileOutcome {
        status: task.status,
        actual_results: task.actual_results,
        status_changed: task.status != previous_status,
        results_grew: task.actual_results > previous_results,
        became_terminal,
        stale: false,
        recovered: false,
    }
}
