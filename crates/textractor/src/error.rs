use std::path::PathBuf;

use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use thiserror::Error;

use crate::analysis::AnalysisError;
use crate::message::DecodeError;
use crate::notify::PublishError;
use crate::storage::ObjectStoreError;
use crate::store::StoreError;

/// Errors from the operator operations.
#[derive(Error, Debug)]
pub enum TextractorError {
    #[error("Object storage error: {0}")]
    Storage(#[from] ObjectStoreError),

    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid analysis result: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variables: {names}")]
    MissingVariable { names: String },

    #[error("Invalid value '{value}' for {name}: {reason}")]
    InvalidValue {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Failed to read resources file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse resources JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Resources validation failed: {message}")]
    Validation { message: String },
}

/// Failure while processing a single queue record.
///
/// Display output is what ends up in the job record's `Error` attribute, so
/// wrapped collaborator errors are transparent.
#[derive(Error, Debug)]
pub enum JobError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Object key '{0}' does not match input/<job_id>/<filename>")]
    InvalidKey(String),

    #[error("Job id '{job_id}' is not a valid job tag (it would be sent as '{tag}')")]
    InvalidJobId { job_id: String, tag: String },

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Storage(#[from] ObjectStoreError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error("Failed to serialize analysis result: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TextractorError>;

/// Renders an AWS SDK error as `<code>: <message>`, falling back to the full
/// error chain when the service returned no metadata.
pub(crate) fn describe_sdk_error<E>(err: &E) -> String
where
    E: ProvideErrorMetadata + std::error::Error,
{
    match (err.code(), err.message()) {
        (Some(code), Some(message)) if code != message => format!("{}: {}", code, message),
        (Some(code), _) => code.to_string(),
        (None, Some(message)) => message.to_string(),
        (None, None) => DisplayErrorContext(err).to_string(),
    }
}
