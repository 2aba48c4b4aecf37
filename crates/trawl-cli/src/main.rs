use anyhow::Context;
use clap::Parser;
use trawl_config::TrawlConfig;

mod cli;
mod commands;
mod context;
mod output;
mod progress;
mod ui;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("trawl error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let flags = cli.global_flags();
    ui::init(&flags);

    let mut config = TrawlConfig::load_with_dotenv().context("failed to load trawl configuration")?;
    if let Some(base_url) = &flags.base_url {
        config.api.base_url.clone_from(base_url);
    }

    // Credential commands never need the tracker.
    if let cli::Commands::Auth { action } = &cli.command {
        return commands::auth::handle(action, &config, &flags).await;
    }

    let ctx = context::AppContext::init(config).context("failed to initialize trawl client")?;
    let result = commands::dispatch::dispatch(cli.command, &ctx, &flags).await;
    ctx.tracker.shutdown().await;
    result
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("TRAWL_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    // stdout carries command output only.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
