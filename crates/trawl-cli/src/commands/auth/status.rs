use serde::Serialize;
use trawl_client::{ApiClient, ClientError, JobBackend};
use trawl_config::TrawlConfig;

use crate::cli::GlobalFlags;
use crate::context::resolve_session;
use crate::output::output;

#[derive(Serialize)]
struct AuthStatusResponse {
    authenticated: bool,
    token_source: Option<&'static str>,
    credentials_file: Option<String>,
    /// Set only with `--check`.
    accepted_by_backend: Option<bool>,
    note: Option<String>,
}

pub async fn handle(check: bool, config: &TrawlConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let session = resolve_session(config);
    let token_source = if config.auth.has_token() {
        Some("config")
    } else if session.is_authenticated() {
        Some("credentials_file")
    } else {
        None
    };
    let mut status = AuthStatusResponse {
        authenticated: session.is_authenticated(),
        token_source,
        credentials_file: session
            .credentials_path()
            .map(|path| path.display().to_string()),
        accepted_by_backend: None,
        note: None,
    };

    if check {
        let client = ApiClient::from_config(&config.api, session)?;
        match client.list_tasks().await {
            Ok(_) => status.accepted_by_backend = Some(true),
            Err(ClientError::SessionExpired) => {
                status.accepted_by_backend = Some(false);
                status.authenticated = false;
                status.note = Some(String::from("token rejected, run `trawl auth login`"));
            }
            Err(error) => return Err(anyhow::Error::new(error).context("failed to reach backend")),
        }
    }

    output(&status, flags.format)
}
