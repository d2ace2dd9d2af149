//! Job status notifications fanned out to downstream consumers.

mod aws;
mod recording;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::job::JobStatus;

pub use aws::SnsPublisher;
pub use recording::RecordingPublisher;

/// `MessageType` attribute carried by queued notifications.
pub const JOB_STATUS_CHANGED: &str = "JobStatusChanged";

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Failed to serialize notification: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("{0}")]
    Topic(String),

    #[error("{0}")]
    Queue(String),
}

/// The published status-change envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub job_id: String,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_job_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_bucket: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn new(job_id: impl Into<String>, status: JobStatus) -> Self {
        Self {
            job_id: job_id.into(),
            status,
            external_job_id: None,
            result_bucket: None,
            result_key: None,
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn failed(job_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self::new(job_id, JobStatus::Failed).with_error(error)
    }

    pub fn with_external_job_id(mut self, id: Option<String>) -> Self {
        self.external_job_id = id;
        self
    }

    pub fn with_result(mut self, bucket: impl Into<String>, key: impl Into<String>) -> Self {
        self.result_bucket = Some(bucket.into());
        self.result_key = Some(key.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

#[async_trait]
pub trait NotificationPublisher: Send + Sync {
    async fn publish(&self, notification: &Notification) -> Result<(), PublishError>;
}
