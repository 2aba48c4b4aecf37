use clap::Subcommand;

/// Credential commands.
#[derive(Clone, Debug, Subcommand)]
pub enum AuthCommands {
    /// Store a bearer token. Reads it from stdin when omitted.
    Login { token: Option<String> },
    /// Forget the stored token.
    Logout,
    /// Show whether a token is configured.
    Status {
        /// Verify the token against the backend.
        #[arg(long)]
        check: bool,
    },
}
