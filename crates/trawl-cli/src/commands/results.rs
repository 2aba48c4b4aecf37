use serde::Serialize;
use trawl_core::enums::Platform;
use trawl_engine::query::group_by_platform;

use crate::cli::root_commands::ResultsArgs;
use crate::cli::{GlobalFlags, OutputFormat};
use crate::commands::shared;
use crate::context::AppContext;
use crate::output::{TableRow, apply_limit, output_rows, render, render_rows};

#[derive(Serialize)]
struct GroupSummary {
    platform: Platform,
    count: usize,
}

impl TableRow for GroupSummary {
    fn headers() -> &'static [&'static str] {
        &["platform", "count"]
    }

    fn cells(&self) -> Vec<String> {
        vec![self.platform.to_string(), self.count.to_string()]
    }
}

pub async fn handle(args: &ResultsArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let results = shared::load_results(ctx, &args.filter).await?;
    let limit = flags.limit.or(Some(ctx.config.general.default_limit));

    if !args.group {
        return output_rows(&apply_limit(results, limit), flags.format);
    }

    let groups = group_by_platform(&results);
    if flags.format != OutputFormat::Table {
        println!("{}", render(&groups, flags.format)?);
        return Ok(());
    }

    let summary: Vec<GroupSummary> = groups
        .iter()
        .map(|group| GroupSummary {
            platform: group.platform,
            count: group.results.len(),
        })
        .collect();
    println!("{}", render_rows(&summary, flags.format)?);
    for group in groups {
        let count = group.results.len();
        println!("\n{} ({count})", group.platform);
        println!("{}", render_rows(&apply_limit(group.results, limit), flags.format)?);
    }
    Ok(())
}
