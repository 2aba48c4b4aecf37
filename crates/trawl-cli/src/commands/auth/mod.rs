pub mod login;
pub mod logout;
pub mod status;

use trawl_config::TrawlConfig;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::AuthCommands;

pub async fn handle(
    action: &AuthCommands,
    config: &TrawlConfig,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        AuthCommands::Login { token } => login::handle(token.as_deref(), config, flags),
        AuthCommands::Logout => logout::handle(config, flags),
        AuthCommands::Status { check } => status::handle(*check, config, flags).await,
    }
}
