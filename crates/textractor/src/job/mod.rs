//! Job record model and the forward-only status machine.

pub mod key;

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use key::{decode_object_key, job_id_from_key, result_key, upload_key};

/// Status of a job record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Processing => "PROCESSING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
        }
    }

    /// `COMPLETED` and `FAILED` admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown job status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for JobStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            // Older tooling wrote SUBMITTED before the analysis started.
            "PROCESSING" | "SUBMITTED" => Ok(JobStatus::Processing),
            "COMPLETED" => Ok(JobStatus::Completed),
            // Older deployments wrote ERROR for failed jobs.
            "FAILED" | "ERROR" => Ok(JobStatus::Failed),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

/// Optional attributes merged into a record by a status update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusDetails {
    /// Storage key of the uploaded source document.
    pub document_key: Option<String>,
    /// Id assigned by the OCR service. Recorded once, never replaced.
    pub external_job_id: Option<String>,
    /// Storage key of the analysis result. Only kept on `COMPLETED`.
    pub result_key: Option<String>,
    /// Failure reason. Only kept on `FAILED`.
    pub error: Option<String>,
}

impl StatusDetails {
    pub fn with_document_key(mut self, key: impl Into<String>) -> Self {
        self.document_key = Some(key.into());
        self
    }

    pub fn with_external_job_id(mut self, id: impl Into<String>) -> Self {
        self.external_job_id = Some(id.into());
        self
    }

    pub fn with_result_key(mut self, key: impl Into<String>) -> Self {
        self.result_key = Some(key.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// The persisted job record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub job_id: String,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_job_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// First time any update was written for this job.
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    /// Returns true if this job is finished (completed or failed).
    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }

    /// Computes the record produced by an upsert of `status` + `details`.
    ///
    /// Returns the current status as the error when `existing` is already
    /// terminal; the caller must leave the stored record untouched.
    pub fn apply(
        existing: Option<&JobRecord>,
        job_id: &str,
        status: JobStatus,
        details: &StatusDetails,
        now: DateTime<Utc>,
    ) -> Result<JobRecord, JobStatus> {
        let mut record = match existing {
            Some(current) if current.is_finished() => return Err(current.status),
            Some(current) => current.clone(),
            None => JobRecord {
                job_id: job_id.to_string(),
                status,
                document_key: None,
                external_job_id: None,
                result_key: None,
                error: None,
                submitted_at: now,
                updated_at: now,
                completed_at: None,
            },
        };

        record.status = status;
        record.updated_at = now;

        if details.document_key.is_some() {
            record.document_key = details.document_key.clone();
        }
        if record.external_job_id.is_none() {
            record.external_job_id = details.external_job_id.clone();
        }
        if status == JobStatus::Completed && details.result_key.is_some() {
            record.result_key = details.result_key.clone();
        }
        if status == JobStatus::Failed && details.error.is_some() {
            record.error = details.error.clone();
        }
        if status.is_terminal() {
            record.completed_at = Some(now);
        }

        Ok(record)
    }
}
