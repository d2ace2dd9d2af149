//! Typed decoding of the queue messages both handlers consume.
//!
//! Each layer (queue body, SNS envelope, service message) fails with its own
//! [`DecodeError`] variant instead of an untyped parse error.

mod completion;
mod upload;

use aws_lambda_events::sqs::SqsMessage;
use thiserror::Error;

pub use completion::{decode_completion, recover_job_id, AnalysisJobState, CompletionNotice};
pub use upload::{decode_upload, UploadMessage, UploadedObject};

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Queue message has no body")]
    MissingBody,

    #[error("Queue message body is not valid JSON: {0}")]
    Envelope(#[source] serde_json::Error),

    #[error("Notification message is malformed: {0}")]
    Message(#[source] serde_json::Error),

    #[error("Notification message is missing '{0}'")]
    MissingField(&'static str),

    #[error("Object key '{key}' is not valid percent-encoded UTF-8")]
    KeyEncoding { key: String },
}

/// One record of a queue batch, detached from the Lambda event types.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueRecord {
    pub message_id: Option<String>,
    pub body: Option<String>,
}

impl QueueRecord {
    pub fn new(message_id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            message_id: Some(message_id.into()),
            body: Some(body.into()),
        }
    }

    pub(crate) fn body(&self) -> Result<&str, DecodeError> {
        match self.body.as_deref() {
            Some(body) if !body.trim().is_empty() => Ok(body),
            _ => Err(DecodeError::MissingBody),
        }
    }

    pub(crate) fn id(&self) -> &str {
        self.message_id.as_deref().unwrap_or("<none>")
    }
}

impl From<SqsMessage> for QueueRecord {
    fn from(message: SqsMessage) -> Self {
        Self {
            message_id: message.message_id,
            body: message.body,
        }
    }
}
