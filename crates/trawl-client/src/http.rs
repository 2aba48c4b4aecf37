//! Shared HTTP response checks for backend calls.
//!
//! Centralizes status-code mapping so the endpoint methods stay focused on
//! request construction and response mapping:
//! - **401** → [`ClientError::SessionExpired`]
//! - **404** on a task-scoped call → [`ClientError::TaskNotFound`]
//! - **400 / 422** → [`ClientError::ValidationRejected`] with the body
//! - **429** → [`ClientError::RateLimited`] with `Retry-After` parsing
//!   (falls back to 60 s if absent or unparseable)
//! - any other non-success → [`ClientError::Api`]

use crate::error::ClientError;

/// Check an HTTP response for error conditions.
///
/// `task_id` names the task a task-scoped request targeted, so a 404 can be
/// reported as [`ClientError::TaskNotFound`].
pub async fn check_response(
    resp: reqwest::Response,
    task_id: Option<&str>,
) -> Result<reqwest::Response, ClientError> {
    let status = resp.status().as_u16();
    if resp.status().is_success() {
        return Ok(resp);
    }
    match (status, task_id) {
        (401, _) => Err(ClientError::SessionExpired),
        (404, Some(id)) => Err(ClientError::TaskNotFound(id.to_string())),
        (400 | 422, _) => Err(ClientError::ValidationRejected(
            resp.text().await.unwrap_or_default(),
        )),
        (429, _) => Err(ClientError::RateLimited {
            retry_after_secs: parse_retry_after(&resp),
        }),
        _ => Err(ClientError::Api {
            status,
            message: resp.text().await.unwrap_or_default(),
        }),
    }
}

/// Parse the `Retry-After` header as seconds, falling back to 60 s.
fn parse_retry_after(resp: &reqwest::Response) -> u64 {
    resp.headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(60)
}
