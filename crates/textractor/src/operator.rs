//! Operator tasks behind the `textractor` CLI: submitting documents,
//! fetching results and rendering job listings.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::analysis::Block;
use crate::error::{Result, TextractorError};
use crate::job::{result_key, upload_key, JobRecord};
use crate::sanitize::{is_valid_job_id, sanitize_job_tag, MAX_JOB_TAG_LEN};
use crate::storage::ObjectStore;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// An uploaded document and the job it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub job_id: String,
    pub key: String,
    pub content_type: String,
}

/// Uploads `path` to `input/<job_id>/<filename>`, which triggers analysis.
///
/// The job id defaults to a random UUID.
pub async fn submit_document(
    objects: &dyn ObjectStore,
    bucket: &str,
    path: &Path,
    job_id: Option<String>,
) -> Result<Submission> {
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            TextractorError::InvalidInput(format!("'{}' has no file name", path.display()))
        })?;

    let job_id = job_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    if !is_valid_job_id(&job_id) {
        return Err(TextractorError::InvalidInput(format!(
            "job id '{}' is not a valid job tag: use at most {} of [A-Za-z0-9_.:-] \
             without a file extension suffix (it would be sent as '{}')",
            job_id,
            MAX_JOB_TAG_LEN,
            sanitize_job_tag(&job_id)
        )));
    }

    let body = tokio::fs::read(path)
        .await
        .map_err(|e| TextractorError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

    let key = upload_key(&job_id, filename);
    let content_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();

    objects.put(bucket, &key, body, &content_type).await?;
    tracing::info!(%job_id, %content_type, "submitted document");

    Ok(Submission {
        job_id,
        key,
        content_type,
    })
}

/// Reads the stored analysis result for `job_id`.
pub async fn fetch_result(
    objects: &dyn ObjectStore,
    bucket: &str,
    job_id: &str,
) -> Result<Vec<Block>> {
    let body = fetch_result_raw(objects, bucket, job_id).await?;
    Ok(serde_json::from_slice(&body)?)
}

pub async fn fetch_result_raw(
    objects: &dyn ObjectStore,
    bucket: &str,
    job_id: &str,
) -> Result<Vec<u8>> {
    Ok(objects.get(bucket, &result_key(job_id)).await?)
}

/// Number of blocks per block type.
pub fn block_counts(blocks: &[Block]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for block in blocks {
        let block_type = block.block_type.as_deref().unwrap_or("UNKNOWN");
        *counts.entry(block_type.to_string()).or_insert(0) += 1;
    }
    counts
}

/// The text of all `LINE` blocks, one per line, in result order.
pub fn line_text(blocks: &[Block]) -> String {
    blocks
        .iter()
        .filter(|block| block.is_type("LINE"))
        .filter_map(|block| block.text.as_deref())
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_time(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|ts| ts.format(TIME_FORMAT).to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Renders records as a table. Errors of failed jobs are listed indented
/// below their row.
pub fn format_job_table(records: &[JobRecord]) -> String {
    if records.is_empty() {
        return "No jobs found\n".to_string();
    }

    let id_width = records
        .iter()
        .map(|r| r.job_id.len())
        .max()
        .unwrap_or(0)
        .max("JOB ID".len());

    let mut out = format!(
        "{:<id_width$}  {:<10}  {:<19}  {:<19}  {}\n",
        "JOB ID",
        "STATUS",
        "SUBMITTED",
        "COMPLETED",
        "TEXTRACT ID",
        id_width = id_width
    );
    out.push_str(&"-".repeat(id_width + 10 + 19 + 19 + 11 + 8));
    out.push('\n');

    for record in records {
        out.push_str(&format!(
            "{:<id_width$}  {:<10}  {:<19}  {:<19}  {}\n",
            record.job_id,
            record.status.as_str(),
            format_time(Some(record.submitted_at)),
            format_time(record.completed_at),
            record.external_job_id.as_deref().unwrap_or("-"),
            id_width = id_width
        ));
        if let Some(error) = &record.error {
            out.push_str(&format!("    Error: {}\n", error));
        }
    }

    out
}

/// Renders one record as `key: value` lines.
pub fn format_job_details(record: &JobRecord) -> String {
    let mut lines = vec![
        format!("Job ID:       {}", record.job_id),
        format!("Status:       {}", record.status),
        format!("Submitted:    {}", format_time(Some(record.submitted_at))),
        format!("Updated:      {}", format_time(Some(record.updated_at))),
        format!("Completed:    {}", format_time(record.completed_at)),
    ];
    let optional = [
        ("Document:     ", &record.document_key),
        ("Textract ID:  ", &record.external_job_id),
        ("Result:       ", &record.result_key),
        ("Error:        ", &record.error),
    ];
    for (label, value) in optional {
        if let Some(value) = value {
            lines.push(format!("{}{}", label, value));
        }
    }
    lines.join("\n") + "\n"
}
