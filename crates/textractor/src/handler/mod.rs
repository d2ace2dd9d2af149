//! Queue handlers for the two pipeline stages.
//!
//! Each record is processed on its own: failures are recorded on the job and
//! counted, never returned to the Lambda runtime, so the queue does not
//! redeliver a record that was already attempted.

mod completion;
mod upload;

use std::sync::Arc;

use aws_config::SdkConfig;
use serde::Serialize;

use crate::analysis::{AnalysisService, TextractAnalysisService};
use crate::config::Settings;
use crate::error::JobError;
use crate::job::{JobStatus, StatusDetails};
use crate::notify::{Notification, NotificationPublisher, SnsPublisher};
use crate::storage::{ObjectStore, S3ObjectStore};
use crate::store::{DynamoJobStore, JobRecordStore, UpdateOutcome};

pub use completion::CompletionHandler;
pub use upload::UploadTriggerHandler;

/// The collaborators a handler talks to.
#[derive(Clone)]
pub struct PipelineClients {
    pub store: Arc<dyn JobRecordStore>,
    pub objects: Arc<dyn ObjectStore>,
    pub analysis: Arc<dyn AnalysisService>,
    pub publisher: Arc<dyn NotificationPublisher>,
}

impl PipelineClients {
    /// Builds the AWS-backed clients from a loaded SDK config.
    pub fn from_aws(config: &SdkConfig, settings: &Settings) -> Self {
        let mut publisher = SnsPublisher::new(
            aws_sdk_sns::Client::new(config),
            &settings.notification_topic_arn,
        );
        if let Some(queue_url) = &settings.notification_queue_url {
            publisher = publisher.with_queue(aws_sdk_sqs::Client::new(config), queue_url);
        }

        Self {
            store: Arc::new(DynamoJobStore::new(
                aws_sdk_dynamodb::Client::new(config),
                &settings.jobs_table,
            )),
            objects: Arc::new(S3ObjectStore::new(aws_sdk_s3::Client::new(config))),
            analysis: Arc::new(TextractAnalysisService::new(aws_sdk_textract::Client::new(
                config,
            ))),
            publisher: Arc::new(publisher),
        }
    }

    /// Marks `job_id` failed and publishes the failure notification.
    ///
    /// A job that is already finished is left untouched and nothing is
    /// published.
    pub(crate) async fn record_failure(
        &self,
        job_id: &str,
        external_job_id: Option<&str>,
        error: &str,
    ) -> Result<Disposition, JobError> {
        let mut details = StatusDetails::default().with_error(error);
        if let Some(id) = external_job_id {
            details = details.with_external_job_id(id);
        }

        match self
            .store
            .update_status(job_id, JobStatus::Failed, &details)
            .await?
        {
            UpdateOutcome::Applied(record) => {
                let notification = Notification::failed(job_id, error)
                    .with_external_job_id(record.external_job_id);
                self.publisher.publish(&notification).await?;
                tracing::info!(job_id, error, "job marked failed");
                Ok(Disposition::Processed)
            }
            UpdateOutcome::Rejected { current } => {
                tracing::warn!(job_id, %current, error, "ignoring failure for finished job");
                Ok(Disposition::Stale)
            }
        }
    }
}

/// How a unit of work ended, when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Disposition {
    Processed,
    /// The job was already finished; nothing was written or published.
    Stale,
}

/// Per-invocation counts, returned as the Lambda response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub processed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl BatchReport {
    pub(crate) fn record(&mut self, result: &Result<Disposition, JobError>) {
        match result {
            Ok(Disposition::Processed) => self.processed += 1,
            Ok(Disposition::Stale) => self.skipped += 1,
            Err(_) => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.processed + self.failed + self.skipped
    }
}
