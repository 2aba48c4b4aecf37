use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::Platform;

/// A single business record collected by a task.
///
/// The platform is carried by the [`PlatformMetrics`] tag, so a result can
/// never hold metrics that belong to another platform. On the wire the tag
/// is flattened into the record as a `platform` field.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ScrapeResult {
    pub id: String,
    pub task_id: String,
    pub business_name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(flatten)]
    pub metrics: PlatformMetrics,
}

impl ScrapeResult {
    #[must_use]
    pub const fn platform(&self) -> Platform {
        self.metrics.platform()
    }
}

/// Platform-specific attachment, keyed by platform.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(tag = "platform", rename_all = "snake_case")]
pub enum PlatformMetrics {
    Google(ReviewMetrics),
    Facebook(ReviewMetrics),
    Instagram(SocialMetrics),
    Linkedin(CompanyMetrics),
}

impl PlatformMetrics {
    #[must_use]
    pub const fn platform(&self) -> Platform {
        match self {
            Self::Google(_) => Platform::Google,
            Self::Facebook(_) => Platform::Facebook,
            Self::Instagram(_) => Platform::Instagram,
            Self::Linkedin(_) => Platform::Linkedin,
        }
    }

    /// Empty metrics under the given platform's tag.
    #[must_use]
    pub fn empty(platform: Platform) -> Self {
        match platform {
            Platform::Google => Self::Google(ReviewMetrics::default()),
            Platform::Facebook => Self::Facebook(ReviewMetrics::default()),
            Platform::Instagram => Self::Instagram(SocialMetrics::default()),
            Platform::Linkedin => Self::Linkedin(CompanyMetrics::default()),
        }
    }

    /// Short human summary, e.g. `4.5/5 (234 reviews)` or `12.5K followers`.
    #[must_use]
    pub fn summary(&self) -> Option<String> {
        match self {
            Self::Google(m) | Self::Facebook(m) => match (m.rating, m.review_count) {
                (Some(rating), Some(count)) => Some(format!("{rating}/5 ({count} reviews)")),
                (Some(rating), None) => Some(format!("{rating}/5")),
                (None, Some(count)) => Some(format!("{count} reviews")),
                (None, None) => None,
            },
            Self::Instagram(m) => m.followers.as_ref().map(|f| format!("{f} followers")),
            Self::Linkedin(m) => m.employees.as_ref().map(|e| format!("{e} employees")),
        }
    }
}

/// Review-site metrics (Google Business, Facebook pages).
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ReviewMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Social profile metrics. Follower counts arrive pre-formatted (`12.5K`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SocialMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub followers: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Company profile metrics. Employee counts are ranges (`201-500`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct CompanyMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employees: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
}
