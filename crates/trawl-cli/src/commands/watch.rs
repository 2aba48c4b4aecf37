use std::collections::HashSet;

use tokio::sync::broadcast::{self, error::RecvError};
use trawl_engine::{StopReason, TaskRecord, Tracker, TrackerEvent};

use crate::cli::root_commands::WatchArgs;
use crate::cli::{GlobalFlags, OutputFormat};
use crate::commands::shared;
use crate::context::AppContext;
use crate::output::output_rows;
use crate::progress::TaskProgress;

pub async fn handle(args: &WatchArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    shared::sync(ctx).await?;
    for task_id in &args.ids {
        shared::ensure_known(ctx, task_id)?;
    }

    let events = ctx.tracker.subscribe();
    let task_ids = if args.ids.is_empty() {
        let started = ctx.tracker.watch_all();
        tracing::debug!(started, "watching unfinished tasks");
        ctx.tracker.watching()
    } else {
        for task_id in &args.ids {
            ctx.tracker.watch(task_id);
        }
        args.ids.clone()
    };

    if task_ids.is_empty() {
        tracing::info!("no unfinished tasks to watch");
    }
    follow(ctx, events, &task_ids, flags).await
}

/// Follow the given tasks until each poll loop stops or the user interrupts,
/// then print their final records.
///
/// `events` must be subscribed before the loops were started so no stop is
/// missed. With `--format raw` every event is also echoed as a JSON line.
pub async fn follow(
    ctx: &AppContext,
    mut events: broadcast::Receiver<TrackerEvent>,
    task_ids: &[String],
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let progress = TaskProgress::new(task_ids);
    let mut pending: HashSet<&str> = task_ids
        .iter()
        .map(String::as_str)
        .filter(|task_id| ctx.tracker.is_watching(task_id))
        .collect();
    let mut session_expired = false;

    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    while !pending.is_empty() {
        tokio::select! {
            received = events.recv() => match received {
                Ok(event) => {
                    if flags.format == OutputFormat::Raw {
                        println!("{}", serde_json::to_string(&event)?);
                    }
                    session_expired |= matches!(event, TrackerEvent::SessionExpired);
                    if let Some(task_id) = show(&ctx.tracker, &progress, &event) {
                        pending.remove(task_id);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "watch fell behind tracker events");
                    pending.retain(|task_id| ctx.tracker.is_watching(task_id));
                }
                Err(RecvError::Closed) => break,
            },
            _ = &mut interrupt => {
                tracing::info!("interrupted, stopping poll loops");
                for task_id in pending.drain() {
                    ctx.tracker.unwatch(task_id);
                }
            }
        }
    }
    progress.finish_all();

    let records: Vec<TaskRecord> = task_ids
        .iter()
        .filter_map(|task_id| ctx.tracker.tasks().get(task_id))
        .collect();
    output_rows(&records, flags.format)?;

    if session_expired {
        anyhow::bail!("session expired, run `trawl auth login`");
    }
    Ok(())
}

/// Reflect one event on the spinners. Returns the task id whose loop ended.
fn show<'e>(tracker: &Tracker, progress: &TaskProgress, event: &'e TrackerEvent) -> Option<&'e str> {
    match event {
        TrackerEvent::StatusChanged {
            task_id,
            status,
            actual_results,
        } => progress.set_message(task_id, &format!("{status}, {actual_results} results")),
        TrackerEvent::ResultsAppended {
            task_id,
            appended,
            total,
        } => progress.set_message(task_id, &format!("+{appended} results, {total} stored")),
        TrackerEvent::Unreachable { task_id } => {
            progress.set_message(task_id, "unreachable, still retrying");
        }
        TrackerEvent::Recovered { task_id } => progress.set_message(task_id, "reachable again"),
        TrackerEvent::TaskMissing { task_id } => {
            progress.set_message(task_id, "not found on the backend");
        }
        TrackerEvent::SessionExpired => {}
        TrackerEvent::Stopped { task_id, reason } => {
            match reason {
                StopReason::Settled => {
                    let summary = tracker.tasks().get(task_id).map_or_else(
                        || String::from("settled"),
                        |record| {
                            format!("{}, {} results", record.task.status, record.task.actual_results)
                        },
                    );
                    progress.finish_ok(task_id, &summary);
                }
                StopReason::Unwatched => progress.finish_err(task_id, "stopped"),
                StopReason::SessionExpired => progress.finish_err(task_id, "session expired"),
                StopReason::Removed => progress.finish_err(task_id, "removed"),
            }
            return Some(task_id.as_str());
        }
    }
    None
}
