//! Engine error types.

use thiserror::Error;
use trawl_client::ClientError;
use trawl_core::CoreError;
use trawl_core::enums::Platform;

/// A record or task that contradicts what the stores already hold.
///
/// These never abort an operation on their own: the offending record is
/// dropped and logged, and the error is reported alongside the outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsistencyError {
    #[error("unknown task: {0}")]
    UnknownTask(String),

    #[error("result {result_id} belongs to task {actual}, not {expected}")]
    ForeignTask {
        result_id: String,
        expected: String,
        actual: String,
    },

    #[error("result {result_id} is from {platform}, which task {task_id} does not cover")]
    ForeignPlatform {
        result_id: String,
        task_id: String,
        platform: Platform,
    },

    #[error("task already tracked: {0}")]
    DuplicateTask(String),
}

/// Errors surfaced by the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Input failed local validation; nothing was sent to the backend.
    #[error("validation rejected: {0}")]
    ValidationRejected(String),

    /// The backend rejected the credential.
    #[error("session expired, run `trawl auth login`")]
    SessionExpired,

    #[error("task not found: {0}")]
    TaskNotFound(String),

    /// Retryable or otherwise unclassified backend failure.
    #[error(transparent)]
    Client(ClientError),

    #[error(transparent)]
    Consistency(#[from] ConsistencyError),

    #[error("export I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("export serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl EngineError {
    /// Whether the poll loop should keep trying after this failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Client(error) => error.is_retryable(),
            _ => false,
        }
    }
}

impl From<ClientError> for EngineError {
    fn from(error: ClientError) -> Self {
        match error {
            ClientError::SessionExpired => Self::SessionExpired,
            ClientError::TaskNotFound(id) => Self::TaskNotFound(id),
            ClientError::ValidationRejected(message) => Self::ValidationRejected(message),
            other => Self::Client(other),
        }
    }
}

impl From<CoreError> for EngineError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::ValidationRejected(message) => Self::ValidationRejected(message),
            other => Self::ValidationRejected(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_classified() {
        assert!(matches!(
            EngineError::from(ClientError::SessionExpired),
            EngineError::SessionExpired
        ));
        assert!(matches!(
            EngineError::from(ClientError::TaskNotFound("task_1".into())),
            EngineError::TaskNotFound(ref id) if id == "task_1"
        ));
        let rate_limited = EngineError::from(ClientError::RateLimited {
            retry_after_secs: 1,
        });
        assert!(rate_limited.is_retryable());
    }

    #[test]
    fn consistency_errors_are_final() {
        let err = EngineError::from(ConsistencyError::UnknownTask("task_x".into()));
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "unknown task: task_x");
    }
}
