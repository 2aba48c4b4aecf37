use std::io::BufRead;

use anyhow::Context;
use serde::Serialize;
use trawl_config::TrawlConfig;

use crate::cli::GlobalFlags;
use crate::context::resolve_session;
use crate::output::output;

#[derive(Serialize)]
struct AuthLoginResponse {
    stored: bool,
    credentials_file: String,
    note: Option<String>,
}

pub fn handle(token: Option<&str>, config: &TrawlConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let token = match token {
        Some(token) => token.trim().to_string(),
        None => read_token(std::io::stdin().lock())?,
    };
    if token.is_empty() {
        anyhow::bail!("no token given");
    }

    let session = resolve_session(config);
    let path = session
        .credentials_path()
        .map(|path| path.display().to_string())
        .context("no credentials file location, set TRAWL_AUTH__CREDENTIALS_FILE")?;
    session.store(&token)?;
    tracing::info!(path = %path, "token stored");

    let note = config
        .auth
        .has_token()
        .then(|| String::from("TRAWL_AUTH__TOKEN is set and takes precedence over this file"));
    output(
        &AuthLoginResponse {
            stored: true,
            credentials_file: path,
            note,
        },
        flags.format,
    )
}

/// First non-blank line of `input`, trimmed.
fn read_token(input: impl BufRead) -> anyhow::Result<String> {
    for line in input.lines() {
        let line = line.context("failed to read token from stdin")?;
        let line = line.trim();
        if !line.is_empty() {
            return Ok(line.to_string());
        }
    }
    Ok(String::new())
}
