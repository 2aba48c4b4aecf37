use clap::Parser;

pub mod global;
pub mod root_commands;
pub mod subcommands;

pub use global::{GlobalFlags, OutputFormat};
pub use root_commands::Commands;

/// Top-level CLI parser for the `trawl` binary.
#[derive(Debug, Parser)]
#[command(
    name = "trawl",
    version,
    about = "Trawl - submit business-data scraping jobs and collect their results"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, table, raw
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Max rows to print
    #[arg(short, long, global = true)]
    pub limit: Option<u32>,

    /// Quiet mode (errors only, no progress)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Backend base URL, overriding configuration
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,
}

impl Cli {
    #[must_use]
    pub fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
            limit: self.limit,
            quiet: self.quiet,
            base_url: self.base_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};
    use pretty_assertions::assert_eq;
    use trawl_core::enums::{Platform, TaskStatus};
    use trawl_engine::export::ExportFormat;
    use trawl_engine::query::{PlatformFilter, StatusFilter};

    use super::subcommands::AuthCommands;
    use super::{Cli, Commands, OutputFormat};

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_before_subcommand() {
        let cli = Cli::try_parse_from([
            "trawl", "--format", "table", "--limit", "10", "--verbose", "tasks",
        ])
        .expect("cli should parse");

        assert_eq!(cli.format, OutputFormat::Table);
        assert_eq!(cli.limit, Some(10));
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Tasks(_)));
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["trawl", "status", "task_1", "-f", "raw", "-q"])
            .expect("cli should parse");

        assert_eq!(cli.format, OutputFormat::Raw);
        assert!(cli.quiet);
        assert!(matches!(cli.command, Commands::Status { ref id } if id == "task_1"));
    }

    #[test]
    fn output_format_rejects_invalid_value() {
        let result = Cli::try_parse_from(["trawl", "--format", "yaml", "tasks"]);
        assert!(result.is_err());
    }

    #[test]
    fn submit_collects_repeated_and_comma_separated_platforms() {
        let cli = Cli::try_parse_from([
            "trawl",
            "submit",
            "restaurants in Manhattan",
            "-p",
            "google,facebook",
            "--platform",
            "LinkedIn",
            "--max-results",
            "50",
            "--watch",
        ])
        .expect("cli should parse");

        let Commands::Submit(args) = cli.command else {
            panic!("expected submit");
        };
        assert_eq!(args.query, "restaurants in Manhattan");
        assert_eq!(
            args.platforms,
            vec![Platform::Google, Platform::Facebook, Platform::Linkedin]
        );
        assert_eq!(args.max_results, Some(50));
        assert!(args.watch);
    }

    #[test]
    fn submit_rejects_unknown_platform() {
        let result = Cli::try_parse_from(["trawl", "submit", "cafes", "-p", "myspace"]);
        assert!(result.is_err());
    }

    #[test]
    fn task_filters_default_to_all() {
        let cli = Cli::try_parse_from(["trawl", "tasks"]).expect("cli should parse");
        let Commands::Tasks(args) = cli.command else {
            panic!("expected tasks");
        };
        assert_eq!(args.status, StatusFilter::All);
        assert_eq!(args.search, None);
        assert!(!args.stats);

        let cli = Cli::try_parse_from(["trawl", "tasks", "--status", "running"])
            .expect("cli should parse");
        let Commands::Tasks(args) = cli.command else {
            panic!("expected tasks");
        };
        assert_eq!(args.status, StatusFilter::Only(TaskStatus::Running));
    }

    #[test]
    fn export_format_is_separate_from_output_format() {
        let cli = Cli::try_parse_from([
            "trawl",
            "export",
            "--as",
            "json",
            "--platform",
            "instagram",
            "-o",
            "out.json",
            "--format",
            "table",
        ])
        .expect("cli should parse");

        assert_eq!(cli.format, OutputFormat::Table);
        let Commands::Export(args) = cli.command else {
            panic!("expected export");
        };
        assert_eq!(args.export_format, Some(ExportFormat::Json));
        assert_eq!(args.filter.platform, PlatformFilter::Only(Platform::Instagram));
        assert_eq!(args.output.as_deref(), Some(std::path::Path::new("out.json")));
    }

    #[test]
    fn auth_login_token_is_optional() {
        let cli = Cli::try_parse_from(["trawl", "auth", "login"]).expect("cli should parse");
        assert!(matches!(
            cli.command,
            Commands::Auth {
                action: AuthCommands::Login { token: None }
            }
        ));
    }

    #[test]
    fn base_url_override_is_global() {
        let cli = Cli::try_parse_from([
            "trawl",
            "watch",
            "task_1",
            "task_2",
            "--base-url",
            "http://127.0.0.1:9000/api",
        ])
        .expect("cli should parse");

        assert_eq!(
            cli.global_flags().base_url.as_deref(),
            Some("http://127.0.0.1:9000/api")
        );
        let Commands::Watch(args) = cli.command else {
            panic!("expected watch");
        };
        assert_eq!(args.ids, vec!["task_1", "task_2"]);
    }
}
