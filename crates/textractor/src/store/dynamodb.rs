//! DynamoDB-backed job record store.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::Client;
use chrono::{DateTime, Utc};

use super::{JobFilter, JobRecordStore, StoreError, UpdateOutcome};
use crate::error::describe_sdk_error;
use crate::job::{JobRecord, JobStatus, StatusDetails};

const ATTR_JOB_ID: &str = "JobID";
const ATTR_STATUS: &str = "Status";
const ATTR_DOCUMENT_KEY: &str = "DocumentKey";
const ATTR_TEXTRACT_ID: &str = "TextractID";
const ATTR_RESULT_KEY: &str = "ResultKey";
const ATTR_ERROR: &str = "Error";
const ATTR_SUBMITTED_AT: &str = "SubmittedAt";
const ATTR_UPDATED_AT: &str = "UpdatedAt";
const ATTR_COMPLETED_AT: &str = "CompletedAt";

/// Write only if the record is new or still in flight. `ERROR` is the
/// legacy spelling of `FAILED`.
const NOT_TERMINAL_CONDITION: &str =
    "attribute_not_exists(JobID) OR NOT (#status IN (:completed, :failed, :legacy_error))";

#[derive(Debug, Clone)]
pub struct DynamoJobStore {
    client: Client,
    table: String,
}

impl DynamoJobStore {
    pub fn new(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    fn key(job_id: &str) -> (String, AttributeValue) {
        (ATTR_JOB_ID.to_string(), AttributeValue::S(job_id.to_string()))
    }
}

#[async_trait]
impl JobRecordStore for DynamoJobStore {
    #[tracing::instrument(skip(self, details), fields(table = %self.table))]
    async fn update_status(
        &self,
        job_id: &str,
        status: JobStatus,
        details: &StatusDetails,
    ) -> Result<UpdateOutcome, StoreError> {
        let update = UpdateRequest::build(status, details, Utc::now());
        let (key_name, key_value) = Self::key(job_id);

        let result = self
            .client
            .update_item()
            .table_name(&self.table)
            .key(key_name, key_value)
            .update_expression(update.expression)
            .condition_expression(NOT_TERMINAL_CONDITION)
            .set_expression_attribute_names(Some(update.names))
            .set_expression_attribute_values(Some(update.values))
            .return_values(ReturnValue::AllNew)
            .send()
            .await;

        match result {
            Ok(output) => {
                let item = output.attributes.unwrap_or_default();
                Ok(UpdateOutcome::Applied(parse_item(&item)?))
            }
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_conditional_check_failed_exception()) =>
            {
                let current = self
                    .get(job_id)
                    .await?
                    .map(|record| record.status)
                    .ok_or_else(|| {
                        StoreError::Request(format!(
                            "conditional write rejected but job '{}' was not found",
                            job_id
                        ))
                    })?;
                tracing::debug!(%current, "update rejected, record is terminal");
                Ok(UpdateOutcome::Rejected { current })
            }
            Err(err) => Err(StoreError::Request(describe_sdk_error(&err))),
        }
    }

    #[tracing::instrument(skip(self), fields(table = %self.table))]
    async fn get(&self, job_id: &str) -> Result<Option<JobRecord>, StoreError> {
        let (key_name, key_value) = Self::key(job_id);
        let output = self
            .client
            .get_item()
            .table_name(&self.table)
            .key(key_name, key_value)
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| StoreError::Request(describe_sdk_error(&e)))?;

        output.item.as_ref().map(parse_item).transpose()
    }

    #[tracing::instrument(skip(self), fields(table = %self.table))]
    async fn list(&self, filter: &JobFilter) -> Result<Vec<JobRecord>, StoreError> {
        let mut records = Vec::new();
        let mut start_key = None;

        loop {
            let output = self
                .client
                .scan()
                .table_name(&self.table)
                .set_exclusive_start_key(start_key)
                .send()
                .await
                .map_err(|e| StoreError::Request(describe_sdk_error(&e)))?;

            for item in output.items.unwrap_or_default() {
                match parse_item(&item) {
                    Ok(record) => records.push(record),
                    Err(e) => tracing::warn!(error = %e, "skipping malformed job record"),
                }
            }

            start_key = output.last_evaluated_key;
            if start_key.is_none() {
                break;
            }
        }

        Ok(filter.apply(records))
    }
}

// ─── Update expression ──────────────────────────────────────────────────────

/// A conditional `UpdateItem` request body, kept separate from the client so
/// the expression can be checked without AWS.
#[derive(Debug)]
struct UpdateRequest {
    expression: String,
    names: HashMap<String, String>,
    values: HashMap<String, AttributeValue>,
}

impl UpdateRequest {
    fn build(status: JobStatus, details: &StatusDetails, now: DateTime<Utc>) -> Self {
        let mut sets = vec![
            "#status = :status".to_string(),
            format!("{} = :now", ATTR_UPDATED_AT),
            format!("{0} = if_not_exists({0}, :now)", ATTR_SUBMITTED_AT),
        ];

        let mut names = HashMap::from([("#status".to_string(), ATTR_STATUS.to_string())]);
        let mut values = HashMap::from([
            (":status".to_string(), s(status.as_str())),
            (":now".to_string(), s(&now.to_rfc3339())),
            (":completed".to_string(), s(JobStatus::Completed.as_str())),
            (":failed".to_string(), s(JobStatus::Failed.as_str())),
            (":legacy_error".to_string(), s("ERROR")),
        ]);

        if let Some(document_key) = &details.document_key {
            sets.push(format!("{} = :document_key", ATTR_DOCUMENT_KEY));
            values.insert(":document_key".to_string(), s(document_key));
        }
        if let Some(external_job_id) = &details.external_job_id {
            sets.push(format!("{0} = if_not_exists({0}, :textract_id)", ATTR_TEXTRACT_ID));
            values.insert(":textract_id".to_string(), s(external_job_id));
        }
        if status == JobStatus::Completed {
            if let Some(result_key) = &details.result_key {
                sets.push(format!("{} = :result_key", ATTR_RESULT_KEY));
                values.insert(":result_key".to_string(), s(result_key));
            }
        }
        if status == JobStatus::Failed {
            if let Some(error) = &details.error {
                sets.push("#error = :error".to_string());
                names.insert("#error".to_string(), ATTR_ERROR.to_string());
                values.insert(":error".to_string(), s(error));
            }
        }
        if status.is_terminal() {
            sets.push(format!("{} = :now", ATTR_COMPLETED_AT));
        }

        Self {
            expression: format!("SET {}", sets.join(", ")),
            names,
            values,
        }
    }
}

fn s(value: &str) -> AttributeValue {
    AttributeValue::S(value.to_string())
}

// ─── Item parsing ───────────────────────────────────────────────────────────

fn string_attr<'a>(item: &'a HashMap<String, AttributeValue>, name: &str) -> Option<&'a str> {
    item.get(name)
        .and_then(|value| value.as_s().ok())
        .map(String::as_str)
}

fn timestamp_attr(
    item: &HashMap<String, AttributeValue>,
    name: &str,
    job_id: &str,
) -> Result<Option<DateTime<Utc>>, StoreError> {
    string_attr(item, name)
        .map(|raw| {
            DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| StoreError::MalformedItem {
                    job_id: job_id.to_string(),
                    reason: format!("{} '{}': {}", name, raw, e),
                })
        })
        .transpose()
}

fn parse_item(item: &HashMap<String, AttributeValue>) -> Result<JobRecord, StoreError> {
    let job_id = string_attr(item, ATTR_JOB_ID).ok_or_else(|| StoreError::MalformedItem {
        job_id: "<unknown>".to_string(),
        reason: format!("missing {}", ATTR_JOB_ID),
    })?;
    let malformed = |reason: String| StoreError::MalformedItem {
        job_id: job_id.to_string(),
        reason,
    };

    let status = string_attr(item, ATTR_STATUS)
        .ok_or_else(|| malformed(format!("missing {}", ATTR_STATUS)))?
        .parse::<JobStatus>()
        .map_err(|e| malformed(e.to_string()))?;

    let submitted_at = timestamp_attr(item, ATTR_SUBMITTED_AT, job_id)?;
    let updated_at = timestamp_attr(item, ATTR_UPDATED_AT, job_id)?;
    // Records written before UpdatedAt existed only carry SubmittedAt.
    let (submitted_at, updated_at) = match (submitted_at, updated_at) {
        (Some(submitted), Some(updated)) => (submitted, updated),
        (Some(ts), None) | (None, Some(ts)) => (ts, ts),
        (None, None) => return Err(malformed("missing timestamps".to_string())),
    };

    Ok(JobRecord {
        job_id: job_id.to_string(),
        status,
        document_key: string_attr(item, ATTR_DOCUMENT_KEY).map(str::to_string),
        external_job_id: string_attr(item, ATTR_TEXTRACT_ID).map(str::to_string),
        result_key: string_attr(item, ATTR_RESULT_KEY).map(str::to_string),
        error: string_attr(item, ATTR_ERROR).map(str::to_string),
        submitted_at,
        updated_at,
        completed_at: timestamp_attr(item, ATTR_COMPLETED_AT, job_id)?,
    })
}
