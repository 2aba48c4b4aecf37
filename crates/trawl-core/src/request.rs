//! Job request packaging.

use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::Platform;
use crate::errors::CoreError;

/// Max-result choices offered by the submission form.
pub const MAX_RESULTS_PRESETS: [u32; 5] = [10, 25, 50, 100, 250];

/// Max results used when the caller does not pick one.
pub const DEFAULT_MAX_RESULTS: u32 = 25;

/// A request to start a new collection job.
///
/// `query` is opaque: it may be a free-text search or a direct URL and is
/// passed to the backend as-is.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct TaskRequest {
    pub query: String,
    pub platforms: BTreeSet<Platform>,
    pub max_results: u32,
}

impl TaskRequest {
    #[must_use]
    pub fn new(
        query: impl Into<String>,
        platforms: impl IntoIterator<Item = Platform>,
        max_results: u32,
    ) -> Self {
        Self {
            query: query.into(),
            platforms: platforms.into_iter().collect(),
            max_results,
        }
    }

    /// Check the parts of the request that bound the task itself.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ValidationRejected`] when no platform is selected
    /// or `max_results` is zero.
    pub fn validate_scope(&self) -> Result<(), CoreError> {
        if self.platforms.is_empty() {
            return Err(CoreError::ValidationRejected(
                "select at least one platform".into(),
            ));
        }
        if self.max_results == 0 {
            return Err(CoreError::ValidationRejected(
                "max results must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Full pre-submission validation.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ValidationRejected`] when the query is blank or
    /// [`validate_scope`](Self::validate_scope) fails.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.query.trim().is_empty() {
            return Err(CoreError::ValidationRejected(
                "enter a search query or URL".into(),
            ));
        }
        self.validate_scope()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_platforms_collapse() {
        let request = TaskRequest::new(
            "coffee shops Brooklyn",
            [Platform::Google, Platform::Google, Platform::Instagram],
            75,
        );
        assert_eq!(request.platforms.len(), 2);
    }

    #[test]
    fn blank_query_is_rejected() {
        let request = TaskRequest::new("   ", [Platform::Google], 10);
        assert!(matches!(
            request.validate(),
            Err(CoreError::ValidationRejected(_))
        ));
        assert!(request.validate_scope().is_ok());
    }

    #[test]
    fn empty_platforms_are_rejected() {
        let request = TaskRequest::new("restaurants", [], 10);
        assert!(request.validate_scope().is_err());
    }

    #[test]
    fn zero_max_results_is_rejected() {
        let request = TaskRequest::new("restaurants", [Platform::Facebook], 0);
        let err = request.validate().unwrap_err();
        assert!(err.to_string().contains("max results"));
    }

    #[test]
    fn url_query_is_accepted_verbatim() {
        let request = TaskRequest::new("https://business.example.com", [Platform::Linkedin], 25);
        assert!(request.validate().is_ok());
        assert_eq!(request.query, "https://business.example.com");
    }

    #[test]
    fn default_is_a_preset() {
        assert!(MAX_RESULTS_PRESETS.contains(&DEFAULT_MAX_RESULTS));
    }
}
