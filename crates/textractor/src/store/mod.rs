//! Job record store: keyed status records shared by both handlers.
//!
//! Every write is conditional. A record that reached a terminal status is
//! never modified again; the store reports such writes as
//! [`UpdateOutcome::Rejected`] instead of failing.

mod dynamodb;
mod error;
mod memory;

use async_trait::async_trait;

use crate::job::{JobRecord, JobStatus, StatusDetails};

pub use dynamodb::DynamoJobStore;
pub use error::StoreError;
pub use memory::MemoryJobStore;

/// Result of a conditional status update.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// The update was written; carries the record as stored.
    Applied(JobRecord),
    /// The record is already terminal and was left untouched.
    Rejected { current: JobStatus },
}

impl UpdateOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, UpdateOutcome::Applied(_))
    }
}

/// Query filter for job listing.
#[derive(Debug, Default, Clone)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub limit: Option<usize>,
}

impl JobFilter {
    /// Filters by status, orders newest `submitted_at` first, then applies the limit.
    pub(crate) fn apply(&self, records: impl IntoIterator<Item = JobRecord>) -> Vec<JobRecord> {
        let mut matching: Vec<JobRecord> = records
            .into_iter()
            .filter(|r| self.status.map_or(true, |s| r.status == s))
            .collect();
        matching.sort_by(|a, b| {
            b.submitted_at
                .cmp(&a.submitted_at)
                .then_with(|| a.job_id.cmp(&b.job_id))
        });
        if let Some(limit) = self.limit {
            matching.truncate(limit);
        }
        matching
    }
}

#[async_trait]
pub trait JobRecordStore: Send + Sync {
    /// Upserts `status` and merges `details` into the record for `job_id`.
    ///
    /// Always touches `updated_at`; terminal statuses also set
    /// `completed_at`. The external job id is only recorded if absent.
    async fn update_status(
        &self,
        job_id: &str,
        status: JobStatus,
        details: &StatusDetails,
    ) -> Result<UpdateOutcome, StoreError>;

    async fn get(&self, job_id: &str) -> Result<Option<JobRecord>, StoreError>;

    async fn list(&self, filter: &JobFilter) -> Result<Vec<JobRecord>, StoreError>;
}
