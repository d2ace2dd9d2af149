//! Document analysis: starting OCR jobs and reading their paginated results.

mod block;
mod textract;

use async_trait::async_trait;
use thiserror::Error;

pub use block::{Block, BoundingBox, Geometry, Relationship};
pub use textract::TextractAnalysisService;

#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The analysis service rejected or failed the call.
    #[error("{0}")]
    Service(String),

    #[error("Analysis service accepted the job but returned no job id")]
    MissingJobId,

    #[error("Invalid analysis request: {0}")]
    InvalidRequest(String),
}

/// Analysis features requested in addition to plain text detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureType {
    Tables,
    Forms,
    Signatures,
}

/// Where the service reports completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationChannel {
    pub role_arn: String,
    pub sns_topic_arn: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartAnalysisRequest {
    pub bucket: String,
    pub key: String,
    pub job_tag: String,
    pub features: Vec<FeatureType>,
    pub notification: NotificationChannel,
    /// Lets the service collapse duplicate starts into one job.
    pub client_request_token: Option<String>,
}

/// One page of analysis output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisPage {
    pub blocks: Vec<Block>,
    pub next_token: Option<String>,
}

#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Starts an asynchronous analysis job and returns the service's job id.
    async fn start_analysis(&self, request: &StartAnalysisRequest) -> Result<String, AnalysisError>;

    async fn get_results(
        &self,
        external_job_id: &str,
        next_token: Option<&str>,
    ) -> Result<AnalysisPage, AnalysisError>;
}

/// Follows continuation tokens until the last page and returns every block
/// in page order.
#[tracing::instrument(skip(service))]
pub async fn collect_blocks(
    service: &dyn AnalysisService,
    external_job_id: &str,
) -> Result<Vec<Block>, AnalysisError> {
    let mut blocks = Vec::new();
    let mut next_token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = service
            .get_results(external_job_id, next_token.as_deref())
            .await?;
        pages += 1;
        blocks.extend(page.blocks);

        match page.next_token {
            Some(token) if !token.is_empty() => next_token = Some(token),
            _ => break,
        }
    }

    tracing::debug!(pages, blocks = blocks.len(), "collected analysis results");
    Ok(blocks)
}
