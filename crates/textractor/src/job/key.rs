//! Object key conventions shared by the handlers and the operator CLI.
//!
//! Uploads land at `input/<job_id>/<filename>`; results are written to
//! `results/<job_id>/analysis.json`.

use std::string::FromUtf8Error;

pub const INPUT_PREFIX: &str = "input/";
pub const RESULTS_PREFIX: &str = "results/";
pub const RESULT_FILENAME: &str = "analysis.json";

/// Decodes an S3 event object key (`+` for space, percent-encoded bytes).
pub fn decode_object_key(raw: &str) -> Result<String, FromUtf8Error> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced).map(|decoded| decoded.into_owned())
}

/// Extracts `<job_id>` from a decoded `input/<job_id>/<filename>` key.
pub fn job_id_from_key(key: &str) -> Option<&str> {
    let rest = key.strip_prefix(INPUT_PREFIX)?;
    let (job_id, filename) = rest.split_once('/')?;
    if job_id.is_empty() || filename.is_empty() {
        return None;
    }
    Some(job_id)
}

pub fn upload_key(job_id: &str, filename: &str) -> String {
    format!("{}{}/{}", INPUT_PREFIX, job_id, filename)
}

pub fn result_key(job_id: &str) -> String {
    format!("{}{}/{}", RESULTS_PREFIX, job_id, RESULT_FILENAME)
}
