use std::collections::BTreeSet;

use trawl_engine::SubmissionForm;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::SubmitArgs;
use crate::commands::watch;
use crate::context::AppContext;
use crate::output::output;

pub async fn handle(args: &SubmitArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let mut form = SubmissionForm::new(ctx.config.general.default_max_results);
    form.set_query(args.query.as_str());
    // `-p google -p google` names one platform, not a toggle pair.
    for platform in args.platforms.iter().copied().collect::<BTreeSet<_>>() {
        form.toggle_platform(platform);
    }
    if let Some(max_results) = args.max_results {
        form.set_max_results(max_results);
    }

    let events = ctx.tracker.subscribe();
    let task = form.submit(&ctx.tracker).await?;

    if args.watch {
        return watch::follow(ctx, events, &[task.id], flags).await;
    }
    output(&task, flags.format)
}
