use tracing::Instrument;

use super::{BatchReport, Disposition, PipelineClients};
use crate::analysis::collect_blocks;
use crate::config::CompletionSettings;
use crate::error::JobError;
use crate::job::{result_key, JobStatus, StatusDetails};
use crate::message::{
    decode_completion, recover_job_id, AnalysisJobState, CompletionNotice, DecodeError,
    QueueRecord,
};
use crate::notify::Notification;
use crate::sanitize::redact_key;
use crate::store::UpdateOutcome;

const RESULT_CONTENT_TYPE: &str = "application/json";

/// Finalizes jobs when the OCR service reports completion.
pub struct CompletionHandler {
    clients: PipelineClients,
    settings: CompletionSettings,
}

impl CompletionHandler {
    pub fn new(clients: PipelineClients, settings: CompletionSettings) -> Self {
        Self { clients, settings }
    }

    #[tracing::instrument(skip_all, fields(records = records.len()))]
    pub async fn handle_batch(&self, records: Vec<QueueRecord>) -> BatchReport {
        let mut report = BatchReport::default();

        for record in &records {
            let span = tracing::info_span!(
                "completion_record",
                message_id = record.id(),
                job_id = tracing::field::Empty,
                object = tracing::field::Empty,
            );
            let result = self.handle_record(record).instrument(span).await;
            report.record(&result);
        }

        tracing::info!(
            processed = report.processed,
            failed = report.failed,
            skipped = report.skipped,
            "completion batch finished"
        );
        report
    }

    async fn handle_record(&self, record: &QueueRecord) -> Result<Disposition, JobError> {
        let notice = match record.body().and_then(decode_completion) {
            Ok(notice) => notice,
            Err(err) => {
                let err = JobError::from(err);
                tracing::error!(error = %err, "undecodable completion message");
                let job_id = record.body.as_deref().and_then(recover_job_id);
                self.fail_after_error(job_id.as_deref(), None, &err).await;
                return Err(err);
            }
        };
        let span = tracing::Span::current();
        span.record("job_id", notice.job_id.as_str());
        if let Some(key) = &notice.document_key {
            span.record("object", redact_key(key));
        }

        match self.process(&notice).await {
            Ok(disposition) => Ok(disposition),
            Err(err) => {
                tracing::error!(error = %err, "completion processing failed");
                self.fail_after_error(
                    Some(&notice.job_id),
                    notice.external_job_id.as_deref(),
                    &err,
                )
                .await;
                Err(err)
            }
        }
    }

    async fn process(&self, notice: &CompletionNotice) -> Result<Disposition, JobError> {
        if let Some(record) = self.clients.store.get(&notice.job_id).await? {
            if record.is_finished() {
                tracing::warn!(current = %record.status, state = %notice.state, "stale completion for finished job");
                return Ok(Disposition::Stale);
            }
        }

        match &notice.state {
            AnalysisJobState::Succeeded => self.complete(notice).await,
            state => {
                let error = notice
                    .status_message
                    .clone()
                    .unwrap_or_else(|| format!("Textract job finished with status {}", state));
                self.clients
                    .record_failure(&notice.job_id, notice.external_job_id.as_deref(), &error)
                    .await
            }
        }
    }

    async fn complete(&self, notice: &CompletionNotice) -> Result<Disposition, JobError> {
        let job_id = notice.job_id.as_str();
        let external_job_id = notice
            .external_job_id
            .as_deref()
            .ok_or(DecodeError::MissingField("JobId"))?;

        let blocks = collect_blocks(self.clients.analysis.as_ref(), external_job_id).await?;
        let body = serde_json::to_vec(&blocks)?;

        let bucket = self.settings.output_bucket.as_str();
        let key = result_key(job_id);
        self.clients
            .objects
            .put(bucket, &key, body, RESULT_CONTENT_TYPE)
            .await?;
        tracing::info!(blocks = blocks.len(), %key, "stored analysis result");

        let details = StatusDetails::default()
            .with_external_job_id(external_job_id)
            .with_result_key(&key);
        match self
            .clients
            .store
            .update_status(job_id, JobStatus::Completed, &details)
            .await?
        {
            UpdateOutcome::Applied(record) => {
                let notification = Notification::new(job_id, JobStatus::Completed)
                    .with_external_job_id(record.external_job_id)
                    .with_result(bucket, key);
                self.clients.publisher.publish(&notification).await?;
                tracing::info!("job completed");
                Ok(Disposition::Processed)
            }
            UpdateOutcome::Rejected { current } => {
                tracing::warn!(%current, "job finished while its result was being stored");
                Ok(Disposition::Stale)
            }
        }
    }

    /// Best-effort fallback: mark the job failed with `err`. Without a job id
    /// there is nothing to update and the error is only logged.
    async fn fail_after_error(
        &self,
        job_id: Option<&str>,
        external_job_id: Option<&str>,
        err: &JobError,
    ) {
        let Some(job_id) = job_id else {
            tracing::error!(error = %err, "cannot recover job id, dropping message");
            return;
        };

        if let Err(fallback) = self
            .clients
            .record_failure(job_id, external_job_id, &err.to_string())
            .await
        {
            tracing::error!(job_id, error = %fallback, "failed to record job failure");
        }
    }
}
