use crate::cli::{Commands, GlobalFlags};
use crate::commands;
use crate::context::AppContext;

/// Route a parsed command to its handler.
pub async fn dispatch(command: Commands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Submit(args) => commands::submit::handle(&args, ctx, flags).await,
        Commands::Tasks(args) => commands::tasks::handle(&args, ctx, flags).await,
        Commands::Status { id } => commands::status::handle(&id, ctx, flags).await,
        Commands::Refresh { id } => commands::refresh::handle(&id, ctx, flags).await,
        Commands::Watch(args) => commands::watch::handle(&args, ctx, flags).await,
        Commands::Results(args) => commands::results::handle(&args, ctx, flags).await,
        Commands::Export(args) => commands::export::handle(&args, ctx, flags).await,
        Commands::Auth { .. } => unreachable!("auth is handled before the tracker starts"),
    }
}
