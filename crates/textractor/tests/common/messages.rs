//! Queue message bodies shaped like the ones AWS delivers.

#![allow(dead_code)]

use serde_json::{json, Value};

use textractor::analysis::{AnalysisPage, Block};
use textractor::QueueRecord;

use super::harness::DOCUMENT_BUCKET;

/// An S3 `ObjectCreated:Put` event for `keys` (already URL-encoded).
pub fn s3_event(keys: &[&str]) -> String {
    let records: Vec<Value> = keys
        .iter()
        .map(|key| {
            json!({
                "eventVersion": "2.1",
                "eventSource": "aws:s3",
                "awsRegion": "us-east-1",
                "eventTime": "2026-01-15T10:00:00.000Z",
                "eventName": "ObjectCreated:Put",
                "s3": {
                    "s3SchemaVersion": "1.0",
                    "bucket": {"name": DOCUMENT_BUCKET, "arn": format!("arn:aws:s3:::{}", DOCUMENT_BUCKET)},
                    "object": {"key": key, "size": 48213, "eTag": "0123456789abcdef"}
                }
            })
        })
        .collect();
    json!({ "Records": records }).to_string()
}

pub fn upload_record(message_id: &str, keys: &[&str]) -> QueueRecord {
    QueueRecord::new(message_id, s3_event(keys))
}

pub fn s3_test_event() -> QueueRecord {
    QueueRecord::new(
        "test-event",
        json!({
            "Service": "Amazon S3",
            "Event": "s3:TestEvent",
            "Time": "2026-01-15T09:00:00.000Z",
            "Bucket": DOCUMENT_BUCKET,
            "RequestId": "5582815E1AEA5ADF",
            "HostId": "8cLeGAmw098X5cv4Zkwcmo8vvZa3eH3eKxsPzbB9wrR+YstdA6Knx4Ip8EXAMPLE"
        })
        .to_string(),
    )
}

/// The inner Textract completion message.
pub fn textract_message(
    job_tag: &str,
    external_job_id: Option<&str>,
    status: &str,
    status_message: Option<&str>,
) -> Value {
    let mut message = json!({
        "Status": status,
        "API": "StartDocumentAnalysis",
        "JobTag": job_tag,
        "Timestamp": 1768471500000u64,
        "DocumentLocation": {"S3ObjectName": format!("input/{}/report.pdf", job_tag), "S3Bucket": DOCUMENT_BUCKET}
    });
    if let Some(id) = external_job_id {
        message["JobId"] = json!(id);
    }
    if let Some(text) = status_message {
        message["StatusMessage"] = json!(text);
    }
    message
}

/// A completion record as delivered through SNS.
pub fn completion_record(
    message_id: &str,
    job_tag: &str,
    external_job_id: Option<&str>,
    status: &str,
    status_message: Option<&str>,
) -> QueueRecord {
    let inner = textract_message(job_tag, external_job_id, status, status_message);
    QueueRecord::new(message_id, sns_envelope(&inner.to_string()))
}

/// A completion record delivered with raw message delivery enabled.
pub fn raw_completion_record(
    message_id: &str,
    job_tag: &str,
    external_job_id: Option<&str>,
    status: &str,
    status_message: Option<&str>,
) -> QueueRecord {
    let inner = textract_message(job_tag, external_job_id, status, status_message);
    QueueRecord::new(message_id, inner.to_string())
}

pub fn sns_envelope(message: &str) -> String {
    json!({
        "Type": "Notification",
        "MessageId": "7c3a6c1e-7f5e-5b2a-9a0e-4d2f0c1b9e11",
        "TopicArn": "arn:aws:sns:us-east-1:123456789012:textract-completion",
        "Message": message,
        "Timestamp": "2026-01-15T10:05:00.000Z",
        "SignatureVersion": "1"
    })
    .to_string()
}

pub fn block(id: &str) -> Block {
    Block {
        block_type: Some("LINE".to_string()),
        id: Some(id.to_string()),
        text: Some(format!("line {}", id)),
        ..Default::default()
    }
}

pub fn page(ids: &[&str], next_token: Option<&str>) -> AnalysisPage {
    AnalysisPage {
        blocks: ids.iter().map(|id| block(id)).collect(),
        next_token: next_token.map(str::to_string),
    }
}
