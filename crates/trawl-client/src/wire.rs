//! Backend JSON shapes and their mapping into core types.

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use trawl_core::CoreError;
use trawl_core::entities::{
    CompanyMetrics, PlatformMetrics, ReviewMetrics, ScrapeResult, SocialMetrics,
};
use trawl_core::enums::{Platform, TaskStatus};
use trawl_core::request::TaskRequest;
use trawl_core::snapshot::{RemoteTask, TaskHandle, TaskSnapshot};

// ── Requests ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SubmitBody<'a> {
    pub query: &'a str,
    pub platforms: Vec<&'static str>,
    pub max_results: u32,
}

impl<'a> SubmitBody<'a> {
    pub fn from_request(request: &'a TaskRequest) -> Self {
        Self {
            query: request.query.trim(),
            platforms: request.platforms.iter().map(|p| p.as_str()).collect(),
            max_results: request.max_results,
        }
    }
}

// ── Responses ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    pub task_id: String,
    #[serde(default = "pending")]
    pub status: TaskStatus,
    #[serde(default)]
    pub message: Option<String>,
}

const fn pending() -> TaskStatus {
    TaskStatus::Pending
}

impl SubmitResponse {
    pub fn into_handle(self) -> TaskHandle {
        TaskHandle {
            task_id: self.task_id,
            status: self.status,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusResponse {
    pub task_id: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub actual_results: Option<u32>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl StatusResponse {
    pub fn into_snapshot(self) -> TaskSnapshot {
        TaskSnapshot {
            task_id: self.task_id,
            status: self.status,
            actual_results: self.actual_results.unwrap_or(0),
            completed_at: self.completed_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ResultsResponse {
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub results: Vec<WireResult>,
}

/// One record as the backend sends it: a flat bag of optional fields.
#[derive(Debug, Deserialize)]
pub struct WireResult {
    #[serde(default)]
    pub id: Option<String>,
    pub platform: String,
    #[serde(default)]
    pub business_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub review_count: Option<u32>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub followers: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub employees: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl WireResult {
    /// Map into a [`ScrapeResult`] owned by `task_id`. Records without an id
    /// get the positional id `{task_id}:{index}`.
    ///
    /// Fields that do not belong to the record's platform are dropped.
    pub fn into_result(self, task_id: &str, index: usize) -> Result<ScrapeResult, CoreError> {
        let platform = Platform::from_str(&self.platform)?;
        let metrics = match platform {
            Platform::Google | Platform::Facebook => {
                let review = ReviewMetrics {
                    rating: self.rating,
                    review_count: self.review_count,
                    category: self.category,
                };
                if platform == Platform::Google {
                    PlatformMetrics::Google(review)
                } else {
                    PlatformMetrics::Facebook(review)
                }
            }
            Platform::Instagram => PlatformMetrics::Instagram(SocialMetrics {
                followers: self.followers,
                category: self.category,
            }),
            Platform::Linkedin => PlatformMetrics::Linkedin(CompanyMetrics {
                employees: self.employees,
                industry: self.industry,
            }),
        };
        Ok(ScrapeResult {
            id: self
                .id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| format!("{task_id}:{index}")),
            task_id: task_id.to_string(),
            business_name: self.business_name,
            description: self.description,
            phone: self.phone,
            website: self.website,
            address: self.address,
            metrics,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct TaskListResponse {
    #[serde(default)]
    pub tasks: Vec<WireTaskSummary>,
}

#[derive(Debug, Deserialize)]
pub struct WireTaskSummary {
    #[serde(alias = "task_id")]
    pub id: String,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub platforms: Vec<String>,
    pub status: TaskStatus,
    #[serde(default)]
    pub max_results: Option<u32>,
    #[serde(default)]
    pub actual_results: Option<u32>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl WireTaskSummary {
    /// Map into a [`RemoteTask`]. Unknown platform names are logged and
    /// skipped; an entry left with no known platform is rejected.
    pub fn into_remote(self) -> Result<RemoteTask, CoreError> {
        let mut platforms = BTreeSet::new();
        for name in &self.platforms {
            match Platform::from_str(name) {
                Ok(platform) => {
                    platforms.insert(platform);
                }
                Err(error) => {
                    tracing::warn!(task_id = %self.id, %error, "skipping unknown platform in listing");
                }
            }
        }
        if platforms.is_empty() {
            return Err(CoreError::ValidationRejected(format!(
                "task {} lists no supported platform",
                self.id
            )));
        }
        Ok(RemoteTask {
            id: self.id,
            query: self.query,
            platforms,
            status: self.status,
            max_results: self.max_results,
            actual_results: self.actual_results.unwrap_or(0),
            created_at: self.created_at,
            completed_at: self.completed_at,
        })
    }
}

// ── Helpers ────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Text(String),
    Number(serde_json::Number),
}

/// Accept `"12.5K"` and `12500` alike.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        Option::<StringOrNumber>::deserialize(deserializer)?.map(|value| match value {
            StringOrNumber::Text(text) => text,
            StringOrNumber::Number(number) => number.to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const RESULTS_FIXTURE: &str = r#"{
        "task_id": "task_001",
        "results": [
            {
                "id": "r1",
                "platform": "google",
                "business_name": "Blue Bottle Coffee",
                "description": "Specialty coffee roaster",
                "phone": "+1 718-555-0100",
                "rating": 4.5,
                "review_count": 234,
                "category": "Coffee Shop",
                "followers": 9000
            },
            {
                "platform": "instagram",
                "business_name": "Devocion",
                "description": "Farm-fresh coffee",
                "followers": "12.5K"
            },
            {
                "platform": "linkedin",
                "business_name": "Partners Coffee",
                "description": "Roaster and cafes",
                "employees": "201-500",
                "industry": "Food & Beverages"
            }
        ]
    }"#;

    #[test]
    fn maps_results_per_platform() {
        let data: ResultsResponse = serde_json::from_str(RESULTS_FIXTURE).unwrap();
        let results: Vec<ScrapeResult> = data
            .results
            .into_iter()
            .enumerate()
            .map(|(i, r)| r.into_result("task_001", i).unwrap())
            .collect();

        assert_eq!(results[0].id, "r1");
        assert_eq!(
            results[0].metrics,
            PlatformMetrics::Google(ReviewMetrics {
                rating: Some(4.5),
                review_count: Some(234),
                category: Some("Coffee Shop".into()),
            })
        );
        assert_eq!(results[1].id, "task_001:1");
        assert_eq!(results[1].metrics.summary().as_deref(), Some("12.5K followers"));
        assert_eq!(results[2].platform(), Platform::Linkedin);
        assert!(results.iter().all(|r| r.task_id == "task_001"));
    }

    #[test]
    fn numeric_followers_become_text() {
        let raw = r#"{"platform": "instagram", "followers": 12500}"#;
        let wire: WireResult = serde_json::from_str(raw).unwrap();
        assert_eq!(wire.followers.as_deref(), Some("12500"));
    }

    #[test]
    fn unknown_platform_is_an_error() {
        let raw = r#"{"platform": "tiktok", "business_name": "x"}"#;
        let wire: WireResult = serde_json::from_str(raw).unwrap();
        assert!(matches!(
            wire.into_result("task_001", 0),
            Err(CoreError::UnknownPlatform(_))
        ));
    }

    #[test]
    fn status_without_count_defaults_to_zero() {
        let raw = r#"{"task_id": "task_002", "status": "running", "progress": 40}"#;
        let snapshot = serde_json::from_str::<StatusResponse>(raw)
            .unwrap()
            .into_snapshot();
        assert_eq!(snapshot.actual_results, 0);
        assert_eq!(snapshot.status, TaskStatus::Running);
    }

    #[test]
    fn listing_accepts_task_id_alias() {
        let raw = r#"{"tasks": [{
            "task_id": "task_003",
            "query": "restaurants",
            "platforms": ["facebook", "myspace"],
            "status": "completed",
            "max_results": 50,
            "actual_results": 50,
            "created_at": "2024-01-15T09:00:00Z",
            "completed_at": "2024-01-15T09:05:00Z"
        }]}"#;
        let data: TaskListResponse = serde_json::from_str(raw).unwrap();
        let remote = data.tasks.into_iter().next().unwrap().into_remote().unwrap();
        assert_eq!(remote.id, "task_003");
        assert_eq!(remote.platforms.len(), 1);
        assert!(remote.platforms.contains(&Platform::Facebook));
    }

    #[test]
    fn listing_entry_without_known_platform_is_rejected() {
        let raw = r#"{
            "id": "task_004",
            "query": "q",
            "platforms": ["myspace"],
            "status": "pending",
            "created_at": "2024-01-15T09:00:00Z"
        }"#;
        let summary: WireTaskSummary = serde_json::from_str(raw).unwrap();
        assert!(summary.into_remote().is_err());
    }

    #[test]
    fn submit_body_trims_query() {
        let request = TaskRequest::new(
            "  coffee shops Brooklyn ",
            [Platform::Instagram, Platform::Google],
            75,
        );
        let body = serde_json::to_value(SubmitBody::from_request(&request)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "query": "coffee shops Brooklyn",
                "platforms": ["google", "instagram"],
                "max_results": 75
            })
        );
    }
}
