use tracing::Instrument;

use super::{BatchReport, Disposition, PipelineClients};
use crate::analysis::{FeatureType, NotificationChannel, StartAnalysisRequest};
use crate::config::UploadSettings;
use crate::error::JobError;
use crate::job::{job_id_from_key, JobStatus, StatusDetails};
use crate::message::{decode_upload, QueueRecord, UploadMessage, UploadedObject};
use crate::sanitize::{client_request_token, is_valid_job_id, redact_key, sanitize_job_tag};
use crate::store::UpdateOutcome;

/// Starts OCR analysis for documents uploaded under `input/<job_id>/`.
pub struct UploadTriggerHandler {
    clients: PipelineClients,
    settings: UploadSettings,
}

impl UploadTriggerHandler {
    pub fn new(clients: PipelineClients, settings: UploadSettings) -> Self {
        Self { clients, settings }
    }

    #[tracing::instrument(skip_all, fields(records = records.len()))]
    pub async fn handle_batch(&self, records: Vec<QueueRecord>) -> BatchReport {
        let mut report = BatchReport::default();

        for record in &records {
            let span = tracing::info_span!("upload_record", message_id = record.id());
            self.handle_record(record, &mut report)
                .instrument(span)
                .await;
        }

        tracing::info!(
            processed = report.processed,
            failed = report.failed,
            skipped = report.skipped,
            "upload batch finished"
        );
        report
    }

    async fn handle_record(&self, record: &QueueRecord, report: &mut BatchReport) {
        let message = match record.body().and_then(decode_upload) {
            Ok(message) => message,
            Err(e) => {
                tracing::error!(error = %e, "dropping undecodable upload message");
                report.failed += 1;
                return;
            }
        };

        let objects = match message {
            UploadMessage::TestEvent => {
                tracing::info!("skipping S3 test event");
                report.skipped += 1;
                return;
            }
            UploadMessage::ObjectsCreated(objects) if objects.is_empty() => {
                tracing::info!("upload message carries no created objects");
                report.skipped += 1;
                return;
            }
            UploadMessage::ObjectsCreated(objects) => objects,
        };

        for object in objects {
            let result = match object {
                Ok(object) => {
                    let span = tracing::info_span!(
                        "upload_object",
                        object = redact_key(&object.key),
                        job_id = tracing::field::Empty,
                    );
                    self.handle_object(&object).instrument(span).await
                }
                Err(e) => {
                    tracing::error!(error = %e, "dropping upload with undecodable key");
                    Err(JobError::from(e))
                }
            };
            report.record(&result);
        }
    }

    /// Starts analysis for one object. On failure the job (if one could be
    /// derived) is marked failed before the error is returned for counting.
    /// A job id that is not its own job tag fails before analysis starts.
    async fn handle_object(&self, object: &UploadedObject) -> Result<Disposition, JobError> {
        let Some(job_id) = job_id_from_key(&object.key) else {
            let err = JobError::InvalidKey(object.key.clone());
            tracing::error!(error = %err, "cannot derive job id from upload");
            return Err(err);
        };
        tracing::Span::current().record("job_id", job_id);

        match self.start_job(job_id, object).await {
            Ok(disposition) => Ok(disposition),
            Err(err) => {
                tracing::error!(error = %err, "failed to start analysis");
                if let Err(fallback) = self
                    .clients
                    .record_failure(job_id, None, &err.to_string())
                    .await
                {
                    tracing::error!(error = %fallback, "failed to record job failure");
                }
                Err(err)
            }
        }
    }

    async fn start_job(
        &self,
        job_id: &str,
        object: &UploadedObject,
    ) -> Result<Disposition, JobError> {
        let tag = sanitize_job_tag(job_id);
        if !is_valid_job_id(job_id) {
            return Err(JobError::InvalidJobId {
                job_id: job_id.to_string(),
                tag,
            });
        }

        let store = &self.clients.store;

        let details = StatusDetails::default().with_document_key(&object.key);
        if let UpdateOutcome::Rejected { current } = store
            .update_status(job_id, JobStatus::Processing, &details)
            .await?
        {
            tracing::warn!(%current, "job already finished, not starting analysis again");
            return Ok(Disposition::Stale);
        }

        let request = self.analysis_request(tag, object);

        let external_job_id = self.clients.analysis.start_analysis(&request).await?;
        tracing::info!(%external_job_id, "started document analysis");

        let details = StatusDetails::default().with_external_job_id(&external_job_id);
        if let UpdateOutcome::Rejected { current } = store
            .update_status(job_id, JobStatus::Processing, &details)
            .await?
        {
            tracing::warn!(%current, %external_job_id, "job finished before its analysis id was recorded");
        }

        Ok(Disposition::Processed)
    }

    fn analysis_request(&self, job_tag: String, object: &UploadedObject) -> StartAnalysisRequest {
        let mut features = vec![FeatureType::Tables, FeatureType::Forms];
        if self.settings.enable_signatures {
            features.push(FeatureType::Signatures);
        }

        StartAnalysisRequest {
            bucket: object.bucket.clone(),
            key: object.key.clone(),
            client_request_token: self
                .settings
                .idempotency_token
                .as_deref()
                .map(|prefix| client_request_token(prefix, &job_tag)),
            job_tag,
            features,
            notification: NotificationChannel {
                role_arn: self.settings.textract_role_arn.clone(),
                sns_topic_arn: self.settings.textract_sns_topic_arn.clone(),
            },
        }
    }
}
