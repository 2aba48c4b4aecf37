use trawl_core::entities::ScrapeResult;
use trawl_engine::TaskRecord;

use super::TableRow;

impl TableRow for TaskRecord {
    fn headers() -> &'static [&'static str] {
        &["id", "status", "results", "platforms", "query", "created"]
    }

    fn cells(&self) -> Vec<String> {
        let task = &self.task;
        let status = if self.unreachable {
            String::from("unreachable")
        } else {
            task.status.to_string()
        };
        vec![
            task.id.clone(),
            status,
            format!("{}/{}", task.actual_results, task.max_results),
            task.platforms
                .iter()
                .map(|platform| platform.as_str())
                .collect::<Vec<_>>()
                .join(","),
            task.query.clone(),
            task.created_at.format("%Y-%m-%d %H:%M").to_string(),
        ]
    }
}

impl TableRow for ScrapeResult {
    fn headers() -> &'static [&'static str] {
        &["platform", "business_name", "metrics", "phone", "website", "task_id"]
    }

    fn cells(&self) -> Vec<String> {
        let or_dash = |value: Option<&String>| value.cloned().unwrap_or_else(|| "-".into());
        vec![
            self.platform().to_string(),
            self.business_name.clone(),
            self.metrics.summary().unwrap_or_else(|| "-".into()),
            or_dash(self.phone.as_ref()),
            or_dash(self.website.as_ref()),
            self.task_id.clone(),
        ]
    }
}
