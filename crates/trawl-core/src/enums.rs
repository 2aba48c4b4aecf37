//! Platform and task status enums for Trawl.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`.
//! [`TaskStatus`] provides `allowed_next_states()` and a stage ordering used by
//! the reconciliation merge to reject regressive snapshots.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::CoreError;

// ---------------------------------------------------------------------------
// Platform
// ---------------------------------------------------------------------------

/// A data source the backend knows how to collect from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Google,
    Facebook,
    Instagram,
    Linkedin,
}

impl Platform {
    /// Every supported platform, in the order the dashboard lists them.
    pub const ALL: [Self; 4] = [Self::Google, Self::Facebook, Self::Instagram, Self::Linkedin];

    /// Return the wire identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Facebook => "facebook",
            Self::Instagram => "instagram",
            Self::Linkedin => "linkedin",
        }
    }

    /// Human-facing label.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Google => "Google Business",
            Self::Facebook => "Facebook",
            Self::Instagram => "Instagram",
            Self::Linkedin => "LinkedIn",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|platform| platform.as_str() == normalized)
            .ok_or_else(|| CoreError::UnknownPlatform(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// TaskStatus
// ---------------------------------------------------------------------------

/// Status of a collection task on the backend.
///
/// ```text
/// pending → running → completed
///         ↘         → failed
///           ────────→ cancelled
/// ```
///
/// A pending task may jump straight to any terminal state. Terminal states
/// have no successors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    #[serde(alias = "canceled")]
    Cancelled,
}

impl TaskStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Running,
        Self::Completed,
        Self::Failed,
        Self::Cancelled,
    ];

    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Running, Self::Completed, Self::Failed, Self::Cancelled],
            Self::Running => &[Self::Completed, Self::Failed, Self::Cancelled],
            Self::Completed | Self::Failed | Self::Cancelled => &[],
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    /// Whether the backend will never move this task again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Position along the lifecycle. All terminal states share the last stage.
    #[must_use]
    pub const fn stage(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Running => 1,
            Self::Completed | Self::Failed | Self::Cancelled => 2,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        // Some backends spell it the American way.
        let normalized = if normalized == "canceled" {
            "cancelled".to_string()
        } else {
            normalized
        };
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| CoreError::UnknownStatus(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn terminal_states_have_no_successors() {
        for status in TaskStatus::ALL {
            if status.is_terminal() {
                assert!(status.allowed_next_states().is_empty(), "{status}");
            }
        }
    }

    #[test]
    fn transitions_only_move_forward() {
        for from in TaskStatus::ALL {
            for to in from.allowed_next_states() {
                assert!(to.stage() > from.stage(), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn running_cannot_go_back_to_pending() {
        assert!(!TaskStatus::Running.can_transition_to(TaskStatus::Pending));
        assert!(TaskStatus::Pending.can_transition_to(TaskStatus::Completed));
    }

    #[rstest]
    #[case("google", Platform::Google)]
    #[case(" LinkedIn ", Platform::Linkedin)]
    #[case("INSTAGRAM", Platform::Instagram)]
    fn platform_parses_case_insensitively(#[case] raw: &str, #[case] expected: Platform) {
        assert_eq!(raw.parse::<Platform>().unwrap(), expected);
    }

    #[test]
    fn platform_rejects_unknown() {
        let err = "myspace".parse::<Platform>().unwrap_err();
        assert_eq!(err, CoreError::UnknownPlatform("myspace".into()));
    }

    #[rstest]
    #[case("pending", TaskStatus::Pending)]
    #[case("Running", TaskStatus::Running)]
    #[case("canceled", TaskStatus::Cancelled)]
    #[case("cancelled", TaskStatus::Cancelled)]
    fn status_parses(#[case] raw: &str, #[case] expected: TaskStatus) {
        assert_eq!(raw.parse::<TaskStatus>().unwrap(), expected);
    }

    #[test]
    fn status_accepts_american_spelling_on_the_wire() {
        let status: TaskStatus = serde_json::from_str("\"canceled\"").unwrap();
        assert_eq!(status, TaskStatus::Cancelled);
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&TaskStatus::Cancelled).unwrap();
        assert_eq!(json, "\"cancelled\"");
    }
}
