// In-memory analysis job store

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::Processing)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A single analysis job. Serializes to the poll response shape.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    #[serde(skip)]
    pub id: String,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    fn processing(id: String) -> Self {
        Self {
            id,
            status: JobStatus::Processing,
            result: None,
            error: None,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Time from submission to the terminal transition. `None` while processing.
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|finished| finished - self.created_at)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Job {0} not found")]
    NotFound(String),

    #[error("Job {id} is already {status}")]
    AlreadyFinished { id: String, status: JobStatus },
}

/// Process-wide job map shared between request handlers and workers.
///
/// Jobs move `processing -> completed | failed` exactly once. Finished jobs
/// are removed after the retention delay.
#[derive(Clone)]
pub struct JobStore {
    inner: Arc<RwLock<HashMap<String, Job>>>,
    retention: Duration,
}

impl JobStore {
    pub fn new(retention: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            retention,
        }
    }

    /// Register a fresh job in the `processing` state and return its id.
    pub async fn create(&self) -> String {
        let id = Uuid::new_v4().to_string();
        let mut guard = self.inner.write().await;
        guard.insert(id.clone(), Job::processing(id.clone()));
        id
    }

    pub async fn get(&self, id: &str) -> Option<Job> {
        let guard = self.inner.read().await;
        guard.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    pub async fn complete(&self, id: &str, result: serde_json::Value) -> Result<(), TransitionError> {
        self.finish(id, JobStatus::Completed, Some(result), None).await
    }

    pub async fn fail(&self, id: &str, error: impl Into<String>) -> Result<(), TransitionError> {
        self.finish(id, JobStatus::Failed, None, Some(error.into())).await
    }

    async fn finish(
        &self,
        id: &str,
        status: JobStatus,
        result: Option<serde_json::Value>,
        error: Option<String>,
    ) -> Result<(), TransitionError> {
        {
            let mut guard = self.inner.write().await;
            let job = guard
                .get_mut(id)
                .ok_or_else(|| TransitionError::NotFound(id.to_string()))?;

            if job.status.is_terminal() {
                return Err(TransitionError::AlreadyFinished {
                    id: id.to_string(),
                    status: job.status,
                });
            }

            job.status = status;
            job.result = result;
            job.error = error;
            job.finished_at = Some(Utc::now());
            debug!(
                job_id = %id,
                status = %status,
                elapsed_ms = job.duration().map_or(0, |d| d.num_milliseconds()),
                "Job finished"
            );
        }

        self.schedule_eviction(id.to_string());
        Ok(())
    }

    fn schedule_eviction(&self, id: String) {
        let inner = Arc::clone(&self.inner);
        let retention = self.retention;
        tokio::spawn(async move {
            tokio::time::sleep(retention).await;
            if inner.write().await.remove(&id).is_some() {
                debug!(job_id = %id, "Evicted finished job");
            } else {
                warn!(job_id = %id, "Job already gone at eviction time");
            }
        });
    }
}
