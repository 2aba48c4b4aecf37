use anyhow::Context;
use serde::Serialize;
use trawl_engine::TaskRecord;

use crate::cli::GlobalFlags;
use crate::commands::shared;
use crate::context::AppContext;
use crate::output::output;

#[derive(Serialize)]
struct RefreshResponse {
    #[serde(flatten)]
    record: TaskRecord,
    status_changed: bool,
    results_appended: usize,
    results_stored: usize,
}

pub async fn handle(task_id: &str, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    shared::sync(ctx).await?;
    shared::ensure_known(ctx, task_id)?;

    let step = ctx
        .tracker
        .refresh(task_id)
        .await
        .with_context(|| format!("failed to refresh task {task_id}"))?;
    let record = ctx
        .tracker
        .tasks()
        .get(task_id)
        .ok_or_else(|| anyhow::anyhow!("task {task_id} not found"))?;

    output(
        &RefreshResponse {
            record,
            status_changed: step.outcome.status_changed,
            results_appended: step.appended,
            results_stored: ctx.tracker.results().count_for(task_id),
        },
        flags.format,
    )
}
