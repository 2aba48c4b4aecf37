//! Client error types.

use thiserror::Error;

/// Errors that can occur when talking to the job backend.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network-level failure: timeout, refused connection, reset stream.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The backend rejected the credential. The stored token has already
    /// been cleared when this is returned.
    #[error("session expired, run `trawl auth login`")]
    SessionExpired,

    /// The backend does not know the requested task.
    #[error("task not found: {0}")]
    TaskNotFound(String),

    /// The backend refused the request payload.
    #[error("validation rejected by backend: {0}")]
    ValidationRejected(String),

    /// The backend returned a 429 Too Many Requests response.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// Backend API returned any other non-success status code.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code returned by the backend.
        status: u16,
        /// Error message or response body.
        message: String,
    },

    /// Failed to parse a backend response.
    #[error("parse error: {0}")]
    Parse(String),

    /// Reading or writing the stored credential failed.
    #[error("credential store error: {0}")]
    CredentialStore(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::Parse(error.to_string())
        } else {
            Self::Transport(error)
        }
    }
}

impl ClientError {
    /// Whether the failure came from the network rather than the backend's
    /// application logic.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Whether retrying the same request later may succeed.
    ///
    /// Auth failures, unknown tasks and rejected payloads are final; they
    /// need a user action, not another attempt.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::RateLimited { .. } | Self::Parse(_) => true,
            Self::Api { status, .. } => *status >= 500,
            Self::SessionExpired
            | Self::TaskNotFound(_)
            | Self::ValidationRejected(_)
            | Self::CredentialStore(_) => false,
        }
    }
}
