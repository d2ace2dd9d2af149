use async_trait::async_trait;
use aws_sdk_sqs::types::MessageAttributeValue;

use super::{Notification, NotificationPublisher, PublishError, JOB_STATUS_CHANGED};
use crate::error::describe_sdk_error;

/// Publishes to an SNS topic and, when a queue is configured, also enqueues
/// the same envelope on SQS.
#[derive(Debug, Clone)]
pub struct SnsPublisher {
    sns: aws_sdk_sns::Client,
    topic_arn: String,
    queue: Option<QueueTarget>,
}

#[derive(Debug, Clone)]
struct QueueTarget {
    client: aws_sdk_sqs::Client,
    url: String,
}

impl SnsPublisher {
    pub fn new(sns: aws_sdk_sns::Client, topic_arn: impl Into<String>) -> Self {
        Self {
            sns,
            topic_arn: topic_arn.into(),
            queue: None,
        }
    }

    pub fn with_queue(mut self, client: aws_sdk_sqs::Client, url: impl Into<String>) -> Self {
        self.queue = Some(QueueTarget {
            client,
            url: url.into(),
        });
        self
    }

    async fn enqueue(
        &self,
        queue: &QueueTarget,
        notification: &Notification,
        body: &str,
    ) -> Result<(), PublishError> {
        let string_attr = |value: &str| {
            MessageAttributeValue::builder()
                .data_type("String")
                .string_value(value)
                .build()
                .map_err(|e| PublishError::Queue(e.to_string()))
        };

        queue
            .client
            .send_message()
            .queue_url(&queue.url)
            .message_body(body)
            .message_attributes("MessageType", string_attr(JOB_STATUS_CHANGED)?)
            .message_attributes("JobId", string_attr(&notification.job_id)?)
            .send()
            .await
            .map_err(|e| PublishError::Queue(describe_sdk_error(&e)))?;
        Ok(())
    }
}

#[async_trait]
impl NotificationPublisher for SnsPublisher {
    #[tracing::instrument(
        skip(self, notification),
        fields(job_id = %notification.job_id, status = %notification.status)
    )]
    async fn publish(&self, notification: &Notification) -> Result<(), PublishError> {
        let body = serde_json::to_string(notification)?;

        self.sns
            .publish()
            .topic_arn(&self.topic_arn)
            .message(&body)
            .send()
            .await
            .map_err(|e| PublishError::Topic(describe_sdk_error(&e)))?;

        if let Some(queue) = &self.queue {
            self.enqueue(queue, notification, &body).await?;
        }

        tracing::debug!("published job status notification");
        Ok(())
    }
}
