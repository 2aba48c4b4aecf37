//! Scripted in-memory `JobBackend` for engine tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use trawl_client::{ClientError, JobBackend};
use trawl_core::entities::{PlatformMetrics, ScrapeResult};
use trawl_core::enums::{Platform, TaskStatus};
use trawl_core::request::TaskRequest;
use trawl_core::snapshot::{RemoteTask, ResultSet, TaskHandle, TaskSnapshot};

/// One scripted reply to a status poll.
#[derive(Debug, Clone)]
pub enum Step {
    Status(TaskStatus, u32, Option<DateTime<Utc>>),
    /// A 503 from the backend. Stands in for any retryable failure,
    /// transport errors included: the tracker counts both the same way
    /// toward the unreachable threshold, and a real `reqwest::Error`
    /// cannot be built without a socket.
    Unavailable,
    NotFound,
    Expired,
}

impl Step {
    fn reply(&self, task_id: &str) -> Result<TaskSnapshot, ClientError> {
        match self {
            Self::Status(status, actual_results, completed_at) => Ok(TaskSnapshot {
                task_id: task_id.to_string(),
                status: *status,
                actual_results: *actual_results,
                completed_at: *completed_at,
            }),
            Self::Unavailable => Err(ClientError::Api {
                status: 503,
                message: "service unavailable".into(),
            }),
            Self::NotFound => Err(ClientError::TaskNotFound(task_id.to_string())),
            Self::Expired => Err(ClientError::SessionExpired),
        }
    }
}

#[derive(Default)]
pub struct ScriptedBackend {
    statuses: Mutex<HashMap<String, VecDeque<Step>>>,
    results: Mutex<HashMap<String, Vec<ScrapeResult>>>,
    failing_results: Mutex<HashSet<String>>,
    listing: Mutex<Vec<RemoteTask>>,
    submit_error: Mutex<Option<ClientError>>,
    pub submitted: Mutex<Vec<TaskRequest>>,
    pub status_calls: AtomicUsize,
    pub result_calls: AtomicUsize,
    next_id: AtomicUsize,
}

impl ScriptedBackend {
    /// Queue status replies for a task. The last one repeats forever.
    pub fn script(&self, task_id: &str, steps: impl IntoIterator<Item = Step>) {
        self.statuses
            .lock()
            .unwrap()
            .entry(task_id.to_string())
            .or_default()
            .extend(steps);
    }

    /// Set the full result set the backend reports for a task.
    pub fn set_results(&self, task_id: &str, results: Vec<ScrapeResult>) {
        self.results
            .lock()
            .unwrap()
            .insert(task_id.to_string(), results);
    }

    /// Make every results pull for a task fail with a 503.
    pub fn fail_results(&self, task_id: &str) {
        self.failing_results
            .lock()
            .unwrap()
            .insert(task_id.to_string());
    }

    pub fn set_listing(&self, listing: Vec<RemoteTask>) {
        *self.listing.lock().unwrap() = listing;
    }

    pub fn fail_next_submit(&self, error: ClientError) {
        *self.submit_error.lock().unwrap() = Some(error);
    }
}

#[async_trait]
impl JobBackend for ScriptedBackend {
    async fn submit(&self, request: &TaskRequest) -> Result<TaskHandle, ClientError> {
        if let Some(error) = self.submit_error.lock().unwrap().take() {
            return Err(error);
        }
        self.submitted.lock().unwrap().push(request.clone());
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(TaskHandle {
            task_id: format!("task_{n:03}"),
            status: TaskStatus::Pending,
        })
    }

    async fn fetch_task_status(&self, task_id: &str) -> Result<TaskSnapshot, ClientError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let mut statuses = self.statuses.lock().unwrap();
        let queue = statuses
            .get_mut(task_id)
            .ok_or_else(|| ClientError::TaskNotFound(task_id.to_string()))?;
        let step = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        step.map_or_else(
            || Err(ClientError::TaskNotFound(task_id.to_string())),
            |step| step.reply(task_id),
        )
    }

    async fn fetch_results(&self, task_id: &str) -> Result<ResultSet, ClientError> {
        self.result_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_results.lock().unwrap().contains(task_id) {
            return Err(ClientError::Api {
                status: 503,
                message: "service unavailable".into(),
            });
        }
        let results = self
            .results
            .lock()
            .unwrap()
            .get(task_id)
            .cloned()
            .unwrap_or_default();
        Ok(ResultSet {
            task_id: task_id.to_string(),
            results,
        })
    }

    async fn list_tasks(&self) -> Result<Vec<RemoteTask>, ClientError> {
        Ok(self.listing.lock().unwrap().clone())
    }
}

pub fn result(id: &str, task_id: &str, platform: Platform, name: &str) -> ScrapeResult {
    ScrapeResult {
        id: id.into(),
        task_id: task_id.into(),
        business_name: name.into(),
        description: format!("{name} description"),
        phone: None,
        website: None,
        address: None,
        metrics: PlatformMetrics::empty(platform),
    }
}

pub fn remote(id: &str, status: TaskStatus, actual_results: u32) -> RemoteTask {
    RemoteTask {
        id: id.into(),
        query: format!("query for {id}"),
        platforms: [Platform::Google, Platform::Facebook].into_iter().collect(),
        status,
        max_results: Some(50),
        actual_results,
        created_at: Utc::now(),
        completed_at: None,
    }
}
