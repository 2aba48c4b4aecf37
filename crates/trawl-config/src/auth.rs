//! Bearer credential settings.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

const CREDENTIALS_DIR: &str = ".trawl";
const CREDENTIALS_FILE_NAME: &str = "credentials";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Bearer token attached to every backend request. Empty means anonymous.
    /// Usually supplied as `TRAWL_AUTH__TOKEN`.
    #[serde(default)]
    pub token: String,

    /// Override for the credentials file written by `trawl auth login`.
    #[serde(default)]
    pub credentials_file: String,
}

impl AuthConfig {
    #[must_use]
    pub fn has_token(&self) -> bool {
        !self.token.trim().is_empty()
    }

    /// Where the stored credential lives: the configured override, else
    /// `~/.trawl/credentials`. `None` when no home directory is known.
    #[must_use]
    pub fn credentials_path(&self) -> Option<PathBuf> {
        if !self.credentials_file.is_empty() {
            return Some(PathBuf::from(&self.credentials_file));
        }
        dirs::home_dir().map(|home| home.join(CREDENTIALS_DIR).join(CREDENTIALS_FILE_NAME))
    }
}
