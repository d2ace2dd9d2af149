use std::sync::Mutex;

use async_trait::async_trait;

use super::{Notification, NotificationPublisher, PublishError};

/// Keeps every published notification in memory.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<Notification>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> Vec<Notification> {
        self.published
            .lock()
            .map(|published| published.clone())
            .unwrap_or_default()
    }

    pub fn for_job(&self, job_id: &str) -> Vec<Notification> {
        self.published()
            .into_iter()
            .filter(|n| n.job_id == job_id)
            .collect()
    }
}

#[async_trait]
impl NotificationPublisher for RecordingPublisher {
    async fn publish(&self, notification: &Notification) -> Result<(), PublishError> {
        tracing::debug!(job_id = %notification.job_id, status = %notification.status, "recorded notification");
        self.published
            .lock()
            .map_err(|_| PublishError::Topic("recording publisher lock poisoned".to_string()))?
            .push(notification.clone());
        Ok(())
    }
}
