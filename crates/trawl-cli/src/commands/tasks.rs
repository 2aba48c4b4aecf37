use trawl_engine::query::{TaskFilter, TaskStats};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::TasksArgs;
use crate::commands::shared;
use crate::context::AppContext;
use crate::output::{apply_limit, output, output_rows};

pub async fn handle(args: &TasksArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    shared::sync(ctx).await?;

    let filter = TaskFilter {
        search: args.search.clone().unwrap_or_default(),
        status: args.status,
    };
    let records = filter.apply(&ctx.tracker.tasks().snapshot());

    if args.stats {
        return output(&TaskStats::from_records(&records), flags.format);
    }

    let limit = flags.limit.or(Some(ctx.config.general.default_limit));
    output_rows(&apply_limit(records, limit), flags.format)
}
