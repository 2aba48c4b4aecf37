use std::sync::Arc;

use trawl_client::{ApiClient, Session};
use trawl_config::TrawlConfig;
use trawl_engine::{PollPolicy, Tracker};

/// Everything a command needs: resolved configuration, the credential, and
/// a tracker wired to the HTTP backend.
pub struct AppContext {
    pub config: TrawlConfig,
    pub tracker: Tracker,
}

impl AppContext {
    /// Build the API client and tracker from configuration.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn init(config: TrawlConfig) -> anyhow::Result<Self> {
        let session = resolve_session(&config);
        if !session.is_authenticated() {
            tracing::debug!("no bearer token configured; requests are anonymous");
        }

        let client = ApiClient::from_config(&config.api, session)?;
        tracing::debug!(base_url = client.base_url(), "api client ready");

        let policy = PollPolicy::from_config(&config.polling, &config.general);
        let tracker = Tracker::with_backend(Arc::new(client), policy);
        Ok(Self { config, tracker })
    }
}

/// Configured token first, then the credentials file.
pub fn resolve_session(config: &TrawlConfig) -> Session {
    Session::resolve(&config.auth.token, config.auth.credentials_path())
}
