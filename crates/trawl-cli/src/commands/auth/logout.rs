use serde::Serialize;
use trawl_config::TrawlConfig;

use crate::cli::GlobalFlags;
use crate::context::resolve_session;
use crate::output::output;

#[derive(Serialize)]
struct AuthLogoutResponse {
    logged_out: bool,
    credentials_file: Option<String>,
    note: Option<String>,
}

pub fn handle(config: &TrawlConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let session = resolve_session(config);
    session.clear();

    let note = config
        .auth
        .has_token()
        .then(|| String::from("TRAWL_AUTH__TOKEN is still set in the environment or config"));
    output(
        &AuthLogoutResponse {
            logged_out: true,
            credentials_file: session
                .credentials_path()
                .map(|path| path.display().to_string()),
            note,
        },
        flags.format,
    )
}
