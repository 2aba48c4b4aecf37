use clap::ValueEnum;

/// How command output is written to stdout.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Raw,
}

/// Flags accepted before or after any subcommand.
#[derive(Clone, Debug)]
pub struct GlobalFlags {
    pub format: OutputFormat,
    pub limit: Option<u32>,
    pub quiet: bool,
    /// Overrides `api.base_url` for this invocation.
    pub base_url: Option<String>,
}
