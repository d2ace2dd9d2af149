//! Scriptable collaborators built on the in-memory implementations.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use textractor::analysis::{AnalysisError, AnalysisPage, AnalysisService, StartAnalysisRequest};
use textractor::notify::{Notification, NotificationPublisher, PublishError, RecordingPublisher};
use textractor::storage::{MemoryObjectStore, ObjectStore, ObjectStoreError};

/// Analysis service with per-tag start outcomes and per-job result pages.
#[derive(Default)]
pub struct ScriptedAnalysis {
    start_failures: Mutex<HashMap<String, String>>,
    pages: Mutex<HashMap<String, Vec<AnalysisPage>>>,
    starts: Mutex<Vec<StartAnalysisRequest>>,
    result_calls: Mutex<Vec<(String, Option<String>)>>,
}

impl ScriptedAnalysis {
    /// Starting a job with `job_tag` fails with the service error `code`.
    pub fn fail_start(&self, job_tag: &str, code: &str) {
        self.start_failures
            .lock()
            .unwrap()
            .insert(job_tag.to_string(), code.to_string());
    }

    /// Result pages served for `external_job_id`, in order.
    pub fn set_pages(&self, external_job_id: &str, pages: Vec<AnalysisPage>) {
        self.pages
            .lock()
            .unwrap()
            .insert(external_job_id.to_string(), pages);
    }

    pub fn starts(&self) -> Vec<StartAnalysisRequest> {
        self.starts.lock().unwrap().clone()
    }

    pub fn result_calls(&self) -> Vec<(String, Option<String>)> {
        self.result_calls.lock().unwrap().clone()
    }

    pub fn external_id_for(job_tag: &str) -> String {
        format!("ext-{}", job_tag)
    }
}

#[async_trait]
impl AnalysisService for ScriptedAnalysis {
    async fn start_analysis(&self, request: &StartAnalysisRequest) -> Result<String, AnalysisError> {
        self.starts.lock().unwrap().push(request.clone());
        if let Some(code) = self.start_failures.lock().unwrap().get(&request.job_tag) {
            return Err(AnalysisError::Service(code.clone()));
        }
        Ok(Self::external_id_for(&request.job_tag))
    }

    async fn get_results(
        &self,
        external_job_id: &str,
        next_token: Option<&str>,
    ) -> Result<AnalysisPage, AnalysisError> {
        let mut calls = self.result_calls.lock().unwrap();
        let index = calls
            .iter()
            .filter(|(id, _)| id == external_job_id)
            .count();
        calls.push((external_job_id.to_string(), next_token.map(str::to_string)));

        self.pages
            .lock()
            .unwrap()
            .get(external_job_id)
            .and_then(|pages| pages.get(index).cloned())
            .ok_or_else(|| AnalysisError::Service("InvalidJobIdException".to_string()))
    }
}

/// Object store that can be switched to fail every write.
#[derive(Default)]
pub struct FlakyObjectStore {
    pub inner: MemoryObjectStore,
    fail_puts: AtomicBool,
}

impl FlakyObjectStore {
    pub fn fail_puts(&self) {
        self.fail_puts.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStore for FlakyObjectStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ObjectStoreError> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(ObjectStoreError::Request("SlowDown: Please reduce your request rate.".to_string()));
        }
        self.inner.put(bucket, key, body, content_type).await
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        self.inner.get(bucket, key).await
    }
}

/// Publisher that fails for selected job ids and records the rest.
#[derive(Default)]
pub struct FlakyPublisher {
    pub inner: RecordingPublisher,
    failing_jobs: Mutex<HashSet<String>>,
}

impl FlakyPublisher {
    pub fn fail_for(&self, job_id: &str) {
        self.failing_jobs.lock().unwrap().insert(job_id.to_string());
    }

    pub fn published(&self) -> Vec<Notification> {
        self.inner.published()
    }

    pub fn for_job(&self, job_id: &str) -> Vec<Notification> {
        self.inner.for_job(job_id)
    }
}

#[async_trait]
impl NotificationPublisher for FlakyPublisher {
    async fn publish(&self, notification: &Notification) -> Result<(), PublishError> {
        if self.failing_jobs.lock().unwrap().contains(&notification.job_id) {
            return Err(PublishError::Topic("InternalErrorException".to_string()));
        }
        self.inner.publish(notification).await
    }
}
