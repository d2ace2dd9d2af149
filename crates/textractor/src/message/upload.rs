use serde::Deserialize;

use super::DecodeError;
use crate::job::decode_object_key;

/// An uploaded object named by an S3 event record. `key` is already decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedObject {
    pub bucket: String,
    pub key: String,
}

#[derive(Debug)]
pub enum UploadMessage {
    /// One entry per created object; a key that fails to decode stays an
    /// error for that object only.
    ObjectsCreated(Vec<Result<UploadedObject, DecodeError>>),
    /// Sent once by S3 when a bucket notification is configured.
    TestEvent,
}

#[derive(Deserialize)]
struct S3Envelope {
    #[serde(rename = "Records")]
    records: Option<Vec<S3Record>>,
    #[serde(rename = "Event")]
    event: Option<String>,
}

#[derive(Deserialize)]
struct S3Record {
    #[serde(rename = "eventName")]
    event_name: Option<String>,
    s3: S3Entity,
}

#[derive(Deserialize)]
struct S3Entity {
    bucket: S3Bucket,
    object: S3Object,
}

#[derive(Deserialize)]
struct S3Bucket {
    name: String,
}

#[derive(Deserialize)]
struct S3Object {
    key: String,
}

/// Decodes the body of an upload-queue message (an S3 event envelope).
///
/// Records for events other than `ObjectCreated:*` are dropped.
pub fn decode_upload(body: &str) -> Result<UploadMessage, DecodeError> {
    let envelope: S3Envelope = serde_json::from_str(body).map_err(DecodeError::Envelope)?;

    if envelope.event.as_deref() == Some("s3:TestEvent") {
        return Ok(UploadMessage::TestEvent);
    }

    let records = envelope.records.ok_or(DecodeError::MissingField("Records"))?;

    let mut objects = Vec::with_capacity(records.len());
    for record in records {
        let created = record
            .event_name
            .as_deref()
            .map_or(true, |name| name.starts_with("ObjectCreated"));
        if !created {
            tracing::debug!(event_name = ?record.event_name, "skipping non-create event");
            continue;
        }

        let S3Entity { bucket, object } = record.s3;
        let object = match decode_object_key(&object.key) {
            Ok(key) => Ok(UploadedObject {
                bucket: bucket.name,
                key,
            }),
            Err(_) => Err(DecodeError::KeyEncoding { key: object.key }),
        };
        objects.push(object);
    }

    Ok(UploadMessage::ObjectsCreated(objects))
}
