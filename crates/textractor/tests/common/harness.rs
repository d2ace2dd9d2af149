//! Test harness wiring both handlers to in-memory collaborators.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use textractor::config::{
    CompletionSettings, UploadSettings, JOBS_TABLE, NOTIFICATION_TOPIC_ARN, OUTPUT_BUCKET,
    TEXTRACT_ROLE_ARN, TEXTRACT_SNS_TOPIC_ARN,
};
use textractor::store::MemoryJobStore;
use textractor::{
    CompletionHandler, JobRecord, JobRecordStore, PipelineClients, UploadTriggerHandler,
};

use super::fakes::{FlakyObjectStore, FlakyPublisher, ScriptedAnalysis};

pub const DOCUMENT_BUCKET: &str = "textractor-documents";
pub const RESULT_BUCKET: &str = "textractor-output";
pub const ROLE_ARN: &str = "arn:aws:iam::123456789012:role/textract-sns-publish";
pub const TEXTRACT_TOPIC_ARN: &str = "arn:aws:sns:us-east-1:123456789012:textract-completion";
pub const STATUS_TOPIC_ARN: &str = "arn:aws:sns:us-east-1:123456789012:job-status";

/// In-memory pipeline: concrete fakes stay reachable for assertions.
pub struct Harness {
    pub store: Arc<MemoryJobStore>,
    pub objects: Arc<FlakyObjectStore>,
    pub analysis: Arc<ScriptedAnalysis>,
    pub publisher: Arc<FlakyPublisher>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            store: Arc::new(MemoryJobStore::new()),
            objects: Arc::new(FlakyObjectStore::default()),
            analysis: Arc::new(ScriptedAnalysis::default()),
            publisher: Arc::new(FlakyPublisher::default()),
        }
    }

    pub fn clients(&self) -> PipelineClients {
        PipelineClients {
            store: self.store.clone(),
            objects: self.objects.clone(),
            analysis: self.analysis.clone(),
            publisher: self.publisher.clone(),
        }
    }

    pub fn upload_handler(&self) -> UploadTriggerHandler {
        self.upload_handler_with(&[])
    }

    /// Upload handler with extra environment variables on top of the defaults.
    pub fn upload_handler_with(&self, extra: &[(&str, &str)]) -> UploadTriggerHandler {
        let mut vars = base_vars();
        vars.insert(TEXTRACT_ROLE_ARN.to_string(), ROLE_ARN.to_string());
        vars.insert(TEXTRACT_SNS_TOPIC_ARN.to_string(), TEXTRACT_TOPIC_ARN.to_string());
        for (name, value) in extra {
            vars.insert(name.to_string(), value.to_string());
        }

        let settings = UploadSettings::from_lookup(|name| vars.get(name).cloned())
            .expect("valid upload settings");
        UploadTriggerHandler::new(self.clients(), settings)
    }

    pub fn completion_handler(&self) -> CompletionHandler {
        let mut vars = base_vars();
        vars.insert(OUTPUT_BUCKET.to_string(), RESULT_BUCKET.to_string());

        let settings = CompletionSettings::from_lookup(|name| vars.get(name).cloned())
            .expect("valid completion settings");
        CompletionHandler::new(self.clients(), settings)
    }

    pub async fn record(&self, job_id: &str) -> JobRecord {
        self.store
            .get(job_id)
            .await
            .unwrap()
            .unwrap_or_else(|| panic!("no record for {}", job_id))
    }

    pub async fn maybe_record(&self, job_id: &str) -> Option<JobRecord> {
        self.store.get(job_id).await.unwrap()
    }
}

fn base_vars() -> HashMap<String, String> {
    HashMap::from([
        (JOBS_TABLE.to_string(), "textractor-jobs".to_string()),
        (NOTIFICATION_TOPIC_ARN.to_string(), STATUS_TOPIC_ARN.to_string()),
    ])
}
