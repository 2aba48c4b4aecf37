//! Job submission form state.

use std::collections::BTreeSet;

use trawl_core::entities::Task;
use trawl_core::enums::Platform;
use trawl_core::request::{DEFAULT_MAX_RESULTS, MAX_RESULTS_PRESETS, TaskRequest};

use crate::error::EngineError;
use crate::tracker::Tracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    Composing,
    Submitted,
}

/// Collects a query, platforms and a result cap, then hands them to the
/// [`Tracker`].
///
/// On success the form resets to its defaults; on failure the input is kept
/// so it can be corrected and resubmitted.
#[derive(Debug, Clone)]
pub struct SubmissionForm {
    query: String,
    platforms: BTreeSet<Platform>,
    max_results: u32,
    default_max_results: u32,
    state: FormState,
}

impl Default for SubmissionForm {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RESULTS)
    }
}

impl SubmissionForm {
    #[must_use]
    pub fn new(default_max_results: u32) -> Self {
        Self {
            query: String::new(),
            platforms: BTreeSet::new(),
            max_results: default_max_results,
            default_max_results,
            state: FormState::Composing,
        }
    }

    /// Suggested caps offered alongside free entry.
    #[must_use]
    pub const fn presets() -> [u32; 5] {
        MAX_RESULTS_PRESETS
    }

    pub fn set_query(&mut self, query: impl Into<String>) -> &mut Self {
        self.query = query.into();
        self
    }

    /// Add the platform if absent, remove it if present.
    pub fn toggle_platform(&mut self, platform: Platform) -> &mut Self {
        if !self.platforms.remove(&platform) {
            self.platforms.insert(platform);
        }
        self
    }

    pub fn set_max_results(&mut self, max_results: u32) -> &mut Self {
        self.max_results = max_results;
        self
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub const fn platforms(&self) -> &BTreeSet<Platform> {
        &self.platforms
    }

    #[must_use]
    pub const fn max_results(&self) -> u32 {
        self.max_results
    }

    #[must_use]
    pub const fn state(&self) -> FormState {
        self.state
    }

    /// The request this form would send, with the query trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ValidationRejected`] for a blank query, no
    /// platform or a zero cap.
    pub fn to_request(&self) -> Result<TaskRequest, EngineError> {
        let request = TaskRequest::new(
            self.query.trim(),
            self.platforms.iter().copied(),
            self.max_results,
        );
        request.validate()?;
        Ok(request)
    }

    /// Validate and submit. Local validation failures never reach the
    /// network.
    ///
    /// # Errors
    ///
    /// Returns the validation or backend error; the form keeps its input.
    pub async fn submit(&mut self, tracker: &Tracker) -> Result<Task, EngineError> {
        let request = self.to_request()?;
        self.state = FormState::Submitted;
        match tracker.submit(request).await {
            Ok(task) => {
                self.reset();
                Ok(task)
            }
            Err(error) => {
                self.state = FormState::Composing;
                Err(error)
            }
        }
    }

    fn reset(&mut self) {
        self.query.clear();
        self.platforms.clear();
        self.max_results = self.default_max_results;
        self.state = FormState::Composing;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_adds_then_removes() {
        let mut form = SubmissionForm::default();
        form.toggle_platform(Platform::Google)
            .toggle_platform(Platform::Instagram)
            .toggle_platform(Platform::Google);
        assert_eq!(form.platforms().len(), 1);
        assert!(form.platforms().contains(&Platform::Instagram));
    }

    #[test]
    fn request_trims_query() {
        let mut form = SubmissionForm::default();
        form.set_query("  coffee shops Brooklyn  ")
            .toggle_platform(Platform::Google);
        let request = form.to_request().unwrap();
        assert_eq!(request.query, "coffee shops Brooklyn");
        assert_eq!(request.max_results, 25);
    }

    #[test]
    fn incomplete_form_is_rejected_locally() {
        let mut form = SubmissionForm::default();
        form.set_query("restaurants");
        assert!(matches!(
            form.to_request(),
            Err(EngineError::ValidationRejected(_))
        ));
        assert_eq!(form.state(), FormState::Composing);
    }

    #[test]
    fn default_cap_is_a_preset() {
        assert!(SubmissionForm::presets().contains(&SubmissionForm::default().max_results()));
    }
}
