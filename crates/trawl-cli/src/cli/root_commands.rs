use std::path::PathBuf;

use clap::{Args, Subcommand};
use trawl_core::enums::Platform;
use trawl_engine::export::ExportFormat;
use trawl_engine::query::{PlatformFilter, StatusFilter};

use crate::cli::subcommands::AuthCommands;

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Submit a scraping job and start tracking it.
    Submit(SubmitArgs),
    /// List tasks known to the backend.
    Tasks(TasksArgs),
    /// Show one task.
    Status { id: String },
    /// Poll one task immediately and pull any new results.
    Refresh { id: String },
    /// Follow tasks until they reach a terminal state.
    Watch(WatchArgs),
    /// Show scraped results.
    Results(ResultsArgs),
    /// Write scraped results to CSV or JSON.
    Export(ExportArgs),
    /// Manage the API bearer token.
    Auth {
        #[command(subcommand)]
        action: AuthCommands,
    },
}

#[derive(Clone, Debug, Args)]
pub struct SubmitArgs {
    /// Search term or profile URL.
    pub query: String,
    /// Platforms to scrape (repeatable or comma-separated).
    #[arg(short, long = "platform", value_delimiter = ',')]
    pub platforms: Vec<Platform>,
    /// Cap on collected results (defaults to `general.default_max_results`).
    #[arg(long)]
    pub max_results: Option<u32>,
    /// Follow the task until it settles.
    #[arg(short, long)]
    pub watch: bool,
}

#[derive(Clone, Debug, Args)]
pub struct TasksArgs {
    /// Substring matched against query and task id.
    #[arg(long)]
    pub search: Option<String>,
    /// Only tasks in this status (or `all`).
    #[arg(long, default_value = "all")]
    pub status: StatusFilter,
    /// Print status counters instead of the task list.
    #[arg(long)]
    pub stats: bool,
}

#[derive(Clone, Debug, Args)]
pub struct WatchArgs {
    /// Task ids to follow. Defaults to every unfinished task.
    pub ids: Vec<String>,
}

/// Selection shared by `results` and `export`.
#[derive(Clone, Debug, Args)]
pub struct ResultFilterArgs {
    /// Only results of this task.
    #[arg(long)]
    pub task: Option<String>,
    /// Substring matched against business name and description.
    #[arg(long)]
    pub search: Option<String>,
    /// Only results from this platform (or `all`).
    #[arg(long, default_value = "all")]
    pub platform: PlatformFilter,
}

#[derive(Clone, Debug, Args)]
pub struct ResultsArgs {
    #[command(flatten)]
    pub filter: ResultFilterArgs,
    /// Group results by platform.
    #[arg(long)]
    pub group: bool,
}

#[derive(Clone, Debug, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub filter: ResultFilterArgs,
    /// File format. Inferred from the output extension, else csv.
    #[arg(long = "as", value_name = "FORMAT")]
    pub export_format: Option<ExportFormat>,
    /// Destination file. Writes to stdout when omitted.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
