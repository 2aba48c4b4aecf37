//! # trawl-engine
//!
//! Task lifecycle tracking and results aggregation for Trawl.
//!
//! - [`TaskStore`] caches tracked tasks and merges backend snapshots into
//!   them monotonically.
//! - [`ResultStore`] accumulates per-task results, deduplicated by id.
//! - [`Tracker`] runs one poll loop per watched task and broadcasts
//!   [`TrackerEvent`]s.
//! - [`query`] filters, searches, groups and summarizes store snapshots.
//! - [`export`] renders a result view as CSV or JSON.
//! - [`SubmissionForm`] validates and submits new jobs.

pub mod error;
pub mod export;
pub mod query;
pub mod reconcile;
pub mod result_store;
pub mod submission;
pub mod task_store;
pub mod tracker;

pub use error::{ConsistencyError, EngineError};
pub use reconcile::ReconcileOutcome;
pub use result_store::{AppendReport, ResultStore};
pub use submission::{FormState, SubmissionForm};
pub use task_store::{Adopted, TaskRecord, TaskStore};
pub use tracker::{PollPolicy, PollStep, StopReason, SyncReport, Tracker, TrackerEvent};
