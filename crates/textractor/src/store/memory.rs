//! In-process job record store.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use super::{JobFilter, JobRecordStore, StoreError, UpdateOutcome};
use crate::job::{JobRecord, JobStatus, StatusDetails};

/// Job record store backed by a `HashMap`, with the same conditional-write
/// semantics as the DynamoDB store.
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    records: RwLock<HashMap<String, JobRecord>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl JobRecordStore for MemoryJobStore {
    async fn update_status(
        &self,
        job_id: &str,
        status: JobStatus,
        details: &StatusDetails,
    ) -> Result<UpdateOutcome, StoreError> {
        let mut records = self.records.write().map_err(|_| StoreError::LockPoisoned)?;

        match JobRecord::apply(records.get(job_id), job_id, status, details, Utc::now()) {
            Ok(record) => {
                records.insert(job_id.to_string(), record.clone());
                Ok(UpdateOutcome::Applied(record))
            }
            Err(current) => Ok(UpdateOutcome::Rejected { current }),
        }
    }

    async fn get(&self, job_id: &str) -> Result<Option<JobRecord>, StoreError> {
        let records = self.records.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(records.get(job_id).cloned())
    }

    async fn list(&self, filter: &JobFilter) -> Result<Vec<JobRecord>, StoreError> {
        let records = self.records.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(filter.apply(records.values().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_update_creates_then_merges() {
        let store = MemoryJobStore::new();

        let first = store
            .update_status(
                "job-1",
                JobStatus::Processing,
                &StatusDetails::default().with_document_key("input/job-1/a.pdf"),
            )
            .await
            .unwrap();
        assert!(first.is_applied());

        store
            .update_status(
                "job-1",
                JobStatus::Processing,
                &StatusDetails::default().with_external_job_id("ext-1"),
            )
            .await
            .unwrap();

        let record = store.get("job-1").await.unwrap().unwrap();
        assert_eq!(record.document_key.as_deref(), Some("input/job-1/a.pdf"));
        assert_eq!(record.external_job_id.as_deref(), Some("ext-1"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_terminal_record_is_final() {
        let store = MemoryJobStore::new();
        store
            .update_status(
                "job-1",
                JobStatus::Completed,
                &StatusDetails::default().with_result_key("results/job-1/analysis.json"),
            )
            .await
            .unwrap();

        let outcome = store
            .update_status(
                "job-1",
                JobStatus::Failed,
                &StatusDetails::default().with_error("late failure"),
            )
            .await
            .unwrap();
        assert_eq!(
            outcome,
            UpdateOutcome::Rejected {
                current: JobStatus::Completed
            }
        );

        let record = store.get("job-1").await.unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Completed);
        assert!(record.error.is_none());
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let store = MemoryJobStore::new();
        assert!(store.get("nope").await.unwrap().is_none());
        assert!(store.is_empty());
    }
}
