//! # trawl-client
//!
//! HTTP client for the remote job backend.
//!
//! The backend exposes four operations:
//! - `POST {base}/scrape` starts a job
//! - `GET {base}/tasks/{id}/status` reports its progress
//! - `GET {base}/tasks/{id}/results` returns everything collected so far
//! - `GET {base}/tasks` lists known tasks
//!
//! [`JobBackend`] is the seam the engine depends on; [`ApiClient`] is the
//! production implementation. Every call carries the bearer token from the
//! shared [`Session`], and a 401 clears it.

mod error;
mod http;
mod session;
mod wire;

pub use error::ClientError;
pub use session::Session;

use async_trait::async_trait;
use trawl_config::ApiConfig;
use trawl_core::request::TaskRequest;
use trawl_core::snapshot::{RemoteTask, ResultSet, TaskHandle, TaskSnapshot};

use crate::http::check_response;
use crate::wire::{ResultsResponse, StatusResponse, SubmitBody, SubmitResponse, TaskListResponse};

/// Remote job backend operations.
#[async_trait]
pub trait JobBackend: Send + Sync {
    /// Start a new job.
    async fn submit(&self, request: &TaskRequest) -> Result<TaskHandle, ClientError>;

    /// Current status of one task.
    async fn fetch_task_status(&self, task_id: &str) -> Result<TaskSnapshot, ClientError>;

    /// Every result the backend holds for one task.
    async fn fetch_results(&self, task_id: &str) -> Result<ResultSet, ClientError>;

    /// All tasks the backend knows for this credential.
    async fn list_tasks(&self) -> Result<Vec<RemoteTask>, ClientError>;
}

// ── Client ─────────────────────────────────────────────────────────

/// reqwest-backed [`JobBackend`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Session,
}

impl ApiClient {
    /// Build a client from the `[api]` config section.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if the underlying `reqwest::Client`
    /// fails to build (e.g. TLS backend initialization).
    pub fn from_config(config: &ApiConfig, session: Session) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout())
            .build()?;
        Ok(Self::new(http, config.normalized_base_url(), session))
    }

    /// Wrap an existing `reqwest::Client`.
    #[must_use]
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, session: Session) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            session,
        }
    }

    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn task_url(&self, task_id: &str, leaf: &str) -> String {
        format!(
            "{}/tasks/{}/{leaf}",
            self.base_url,
            urlencoding::encode(task_id)
        )
    }

    /// Attach the bearer token, send, and map the status code. A rejected
    /// credential is cleared from the session before the error is returned.
    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
        task_id: Option<&str>,
    ) -> Result<reqwest::Response, ClientError> {
        let request = match self.session.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let result = check_response(request.send().await?, task_id).await;
        if matches!(result, Err(ClientError::SessionExpired)) {
            tracing::warn!("backend rejected credential; clearing session");
            self.session.clear();
        }
        result
    }
}

#[async_trait]
impl JobBackend for ApiClient {
    async fn submit(&self, request: &TaskRequest) -> Result<TaskHandle, ClientError> {
        let url = format!("{}/scrape", self.base_url);
        let body = SubmitBody::from_request(request);
        let resp = self.execute(self.http.post(&url).json(&body), None).await?;
        let data: SubmitResponse = resp.json().await?;
        if let Some(message) = &data.message {
            tracing::debug!(task_id = %data.task_id, %message, "submit acknowledged");
        }
        Ok(data.into_handle())
    }

    async fn fetch_task_status(&self, task_id: &str) -> Result<TaskSnapshot, ClientError> {
        let url = self.task_url(task_id, "status");
        let resp = self.execute(self.http.get(&url), Some(task_id)).await?;
        let data: StatusResponse = resp.json().await?;
        Ok(data.into_snapshot())
    }

    async fn fetch_results(&self, task_id: &str) -> Result<ResultSet, ClientError> {
        let url = self.task_url(task_id, "results");
        let resp = self.execute(self.http.get(&url), Some(task_id)).await?;
        let data: ResultsResponse = resp.json().await?;

        let owner = data.task_id.unwrap_or_else(|| task_id.to_string());
        let mut results = Vec::with_capacity(data.results.len());
        for (index, record) in data.results.into_iter().enumerate() {
            match record.into_result(&owner, index) {
                Ok(result) => results.push(result),
                Err(error) => {
                    tracing::warn!(task_id = %owner, index, %error, "skipping unmappable result");
                }
            }
        }
        Ok(ResultSet {
            task_id: owner,
            results,
        })
    }

    async fn list_tasks(&self) -> Result<Vec<RemoteTask>, ClientError> {
        let url = format!("{}/tasks", self.base_url);
        let resp = self.execute(self.http.get(&url), None).await?;
        let data: TaskListResponse = resp.json().await?;
        Ok(data
            .tasks
            .into_iter()
            .filter_map(|summary| {
                summary
                    .into_remote()
                    .inspect_err(|error| tracing::warn!(%error, "skipping listing entry"))
                    .ok()
            })
            .collect())
    }
}
