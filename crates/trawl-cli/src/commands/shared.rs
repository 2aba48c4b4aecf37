use anyhow::Context;
use trawl_core::entities::ScrapeResult;
use trawl_engine::EngineError;
use trawl_engine::query::ResultFilter;

use crate::cli::root_commands::ResultFilterArgs;
use crate::context::AppContext;

/// Pull the backend task listing into the local store.
pub async fn sync(ctx: &AppContext) -> anyhow::Result<()> {
    let report = ctx
        .tracker
        .sync_tasks()
        .await
        .context("failed to sync task listing")?;
    tracing::debug!(
        adopted = report.adopted.len(),
        removed = report.removed.len(),
        "tasks synced"
    );
    Ok(())
}

pub fn ensure_known(ctx: &AppContext, task_id: &str) -> anyhow::Result<()> {
    if ctx.tracker.tasks().contains(task_id) {
        Ok(())
    } else {
        anyhow::bail!("task {task_id} not found")
    }
}

/// Sync, poll the selected tasks once so their results land in the result
/// store, then apply the filter.
///
/// With no `--task`, a task whose poll fails is skipped with a warning
/// unless the session expired.
pub async fn load_results(
    ctx: &AppContext,
    filter: &ResultFilterArgs,
) -> anyhow::Result<Vec<ScrapeResult>> {
    sync(ctx).await?;

    let results = if let Some(task_id) = filter.task.as_deref() {
        ensure_known(ctx, task_id)?;
        ctx.tracker
            .refresh(task_id)
            .await
            .with_context(|| format!("failed to load results for task {task_id}"))?;
        ctx.tracker.results().results_for(task_id)
    } else {
        for task_id in ctx.tracker.tasks().ids() {
            match ctx.tracker.refresh(&task_id).await {
                Ok(step) => tracing::debug!(task_id, appended = step.appended, "results loaded"),
                Err(EngineError::SessionExpired) => return Err(EngineError::SessionExpired.into()),
                Err(error) => tracing::warn!(task_id, %error, "skipping task results"),
            }
        }
        ctx.tracker.results().all_results()
    };

    let view = ResultFilter::new(filter.search.clone().unwrap_or_default(), filter.platform);
    Ok(view.apply(&results))
}
