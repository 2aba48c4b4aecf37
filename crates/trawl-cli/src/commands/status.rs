use crate::cli::GlobalFlags;
use crate::commands::shared;
use crate::context::AppContext;
use crate::output::output;

/// Show a task as the backend listing reports it.
pub async fn handle(task_id: &str, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    shared::sync(ctx).await?;
    let record = ctx
        .tracker
        .tasks()
        .get(task_id)
        .ok_or_else(|| anyhow::anyhow!("task {task_id} not found"))?;
    output(&record, flags.format)
}
