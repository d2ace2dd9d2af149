use serde::Deserialize;
use serde_json::Value;

use super::DecodeError;

/// Terminal state reported by the OCR service for an analysis job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisJobState {
    Succeeded,
    Failed,
    PartialSuccess,
    InProgress,
    Unknown(String),
}

impl AnalysisJobState {
    pub fn parse(s: &str) -> Self {
        match s {
            "SUCCEEDED" => AnalysisJobState::Succeeded,
            "FAILED" => AnalysisJobState::Failed,
            "PARTIAL_SUCCESS" => AnalysisJobState::PartialSuccess,
            "IN_PROGRESS" => AnalysisJobState::InProgress,
            other => AnalysisJobState::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            AnalysisJobState::Succeeded => "SUCCEEDED",
            AnalysisJobState::Failed => "FAILED",
            AnalysisJobState::PartialSuccess => "PARTIAL_SUCCESS",
            AnalysisJobState::InProgress => "IN_PROGRESS",
            AnalysisJobState::Unknown(other) => other,
        }
    }
}

impl std::fmt::Display for AnalysisJobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded completion notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionNotice {
    /// Our job id, carried by the service as `JobTag`.
    pub job_id: String,
    /// The service's job id. Always present when `state` is `Succeeded`.
    pub external_job_id: Option<String>,
    pub state: AnalysisJobState,
    pub status_message: Option<String>,
    /// Key of the analysed document, as reported by the service.
    pub document_key: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawCompletion {
    job_id: Option<String>,
    job_tag: Option<String>,
    status: Option<String>,
    status_message: Option<String>,
    document_location: Option<RawDocumentLocation>,
}

#[derive(Deserialize)]
struct RawDocumentLocation {
    #[serde(rename = "S3ObjectName")]
    key: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Decodes a completion-queue body.
///
/// Accepts an SNS notification envelope whose `Message` holds the service
/// message as a JSON string, or the service message itself (raw delivery).
pub fn decode_completion(body: &str) -> Result<CompletionNotice, DecodeError> {
    let value: Value = serde_json::from_str(body).map_err(DecodeError::Envelope)?;

    let raw: RawCompletion = match value.get("Message").and_then(Value::as_str) {
        Some(message) => serde_json::from_str(message).map_err(DecodeError::Message)?,
        None => serde_json::from_value(value).map_err(DecodeError::Message)?,
    };

    let job_id = non_empty(raw.job_tag).ok_or(DecodeError::MissingField("JobTag"))?;
    let state = non_empty(raw.status)
        .map(|s| AnalysisJobState::parse(&s))
        .ok_or(DecodeError::MissingField("Status"))?;
    let external_job_id = non_empty(raw.job_id);

    if state == AnalysisJobState::Succeeded && external_job_id.is_none() {
        return Err(DecodeError::MissingField("JobId"));
    }

    Ok(CompletionNotice {
        job_id,
        external_job_id,
        state,
        status_message: non_empty(raw.status_message),
        document_key: raw.document_location.and_then(|loc| non_empty(loc.key)),
    })
}

/// Best-effort extraction of `JobTag` from a body the typed decode rejected.
pub fn recover_job_id(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let inner = match value.get("Message").and_then(Value::as_str) {
        Some(message) => serde_json::from_str(message).ok()?,
        None => value,
    };
    inner
        .get("JobTag")
        .and_then(Value::as_str)
        .filter(|tag| !tag.trim().is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sns_wrapped(inner: Value) -> String {
        json!({
            "Type": "Notification",
            "MessageId": "4d1f6b5a-0000-0000-0000-000000000000",
            "TopicArn": "arn:aws:sns:us-east-1:123456789012:textract-completion",
            "Message": inner.to_string(),
            "Timestamp": "2026-01-15T10:00:00.000Z",
        })
        .to_string()
    }

    #[test]
    fn test_decodes_sns_wrapped_success() {
        let body = sns_wrapped(json!({
            "JobId": "ext-abc",
            "Status": "SUCCEEDED",
            "API": "StartDocumentAnalysis",
            "JobTag": "job-42",
            "Timestamp": 1768471200000u64,
            "DocumentLocation": {"S3ObjectName": "input/job-42/report.pdf", "S3Bucket": "docs"}
        }));

        let notice = decode_completion(&body).unwrap();
        assert_eq!(notice.job_id, "job-42");
        assert_eq!(notice.external_job_id.as_deref(), Some("ext-abc"));
        assert_eq!(notice.state, AnalysisJobState::Succeeded);
        assert_eq!(notice.document_key.as_deref(), Some("input/job-42/report.pdf"));
    }

    #[test]
    fn test_decodes_raw_delivery_failure_without_job_id() {
        let body = json!({
            "JobTag": "job-9",
            "Status": "FAILED",
            "StatusMessage": "Unsupported document"
        })
        .to_string();

        let notice = decode_completion(&body).unwrap();
        assert_eq!(notice.job_id, "job-9");
        assert_eq!(notice.state, AnalysisJobState::Failed);
        assert_eq!(notice.status_message.as_deref(), Some("Unsupported document"));
        assert!(notice.external_job_id.is_none());
    }

    #[test]
    fn test_unknown_status_is_preserved() {
        let body = json!({"JobTag": "j", "JobId": "e", "Status": "CANCELLED"}).to_string();
        let notice = decode_completion(&body).unwrap();
        assert_eq!(notice.state, AnalysisJobState::Unknown("CANCELLED".to_string()));
        assert_eq!(notice.state.to_string(), "CANCELLED");
    }

    #[test]
    fn test_success_requires_external_job_id() {
        let body = sns_wrapped(json!({"JobTag": "job-1", "Status": "SUCCEEDED"}));
        assert!(matches!(
            decode_completion(&body),
            Err(DecodeError::MissingField("JobId"))
        ));
    }

    #[test]
    fn test_missing_tag_and_status() {
        let body = json!({"JobId": "e", "Status": "SUCCEEDED"}).to_string();
        assert!(matches!(
            decode_completion(&body),
            Err(DecodeError::MissingField("JobTag"))
        ));

        let body = json!({"JobId": "e", "JobTag": "j"}).to_string();
        assert!(matches!(
            decode_completion(&body),
            Err(DecodeError::MissingField("Status"))
        ));
    }

    #[test]
    fn test_layered_errors() {
        assert!(matches!(
            decode_completion("{"),
            Err(DecodeError::Envelope(_))
        ));
        let body = json!({"Type": "Notification", "Message": "not json"}).to_string();
        assert!(matches!(
            decode_completion(&body),
            Err(DecodeError::Message(_))
        ));
    }

    #[test]
    fn test_recover_job_id() {
        let body = sns_wrapped(json!({"JobTag": "job-7", "Status": "SUCCEEDED"}));
        assert_eq!(recover_job_id(&body).as_deref(), Some("job-7"));

        let raw = json!({"JobTag": "job-8"}).to_string();
        assert_eq!(recover_job_id(&raw).as_deref(), Some("job-8"));

        assert_eq!(recover_job_id("garbage"), None);
        assert_eq!(recover_job_id(r#"{"JobTag": ""}"#), None);
    }
}
