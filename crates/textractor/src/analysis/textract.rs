//! Amazon Textract document analysis.

use async_trait::async_trait;
use aws_sdk_textract::types as tx;
use aws_sdk_textract::Client;

use super::{
    AnalysisError, AnalysisPage, AnalysisService, Block, BoundingBox, FeatureType, Geometry,
    Relationship, StartAnalysisRequest,
};
use crate::error::describe_sdk_error;
use crate::sanitize::redact_key;

#[derive(Debug, Clone)]
pub struct TextractAnalysisService {
    client: Client,
}

impl TextractAnalysisService {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AnalysisService for TextractAnalysisService {
    #[tracing::instrument(
        skip(self, request),
        fields(job_tag = %request.job_tag, object = redact_key(&request.key))
    )]
    async fn start_analysis(&self, request: &StartAnalysisRequest) -> Result<String, AnalysisError> {
        let location = tx::DocumentLocation::builder()
            .s3_object(
                tx::S3Object::builder()
                    .bucket(&request.bucket)
                    .name(&request.key)
                    .build(),
            )
            .build();
        let channel = tx::NotificationChannel::builder()
            .sns_topic_arn(&request.notification.sns_topic_arn)
            .role_arn(&request.notification.role_arn)
            .build()
            .map_err(|e| AnalysisError::InvalidRequest(e.to_string()))?;

        let mut call = self
            .client
            .start_document_analysis()
            .document_location(location)
            .job_tag(&request.job_tag)
            .notification_channel(channel)
            .set_client_request_token(request.client_request_token.clone());
        for feature in &request.features {
            call = call.feature_types(feature.to_textract());
        }

        let output = call
            .send()
            .await
            .map_err(|e| AnalysisError::Service(describe_sdk_error(&e)))?;

        output
            .job_id()
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .ok_or(AnalysisError::MissingJobId)
    }

    #[tracing::instrument(skip(self))]
    async fn get_results(
        &self,
        external_job_id: &str,
        next_token: Option<&str>,
    ) -> Result<AnalysisPage, AnalysisError> {
        let output = self
            .client
            .get_document_analysis()
            .job_id(external_job_id)
            .set_next_token(next_token.map(str::to_string))
            .send()
            .await
            .map_err(|e| AnalysisError::Service(describe_sdk_error(&e)))?;

        Ok(AnalysisPage {
            blocks: output.blocks().iter().map(Block::from).collect(),
            next_token: output.next_token().map(str::to_string),
        })
    }
}

impl FeatureType {
    fn to_textract(self) -> tx::FeatureType {
        match self {
            FeatureType::Tables => tx::FeatureType::Tables,
            FeatureType::Forms => tx::FeatureType::Forms,
            FeatureType::Signatures => tx::FeatureType::Signatures,
        }
    }
}

impl From<&tx::Block> for Block {
    fn from(block: &tx::Block) -> Self {
        Block {
            block_type: block.block_type().map(|t| t.as_str().to_string()),
            id: block.id().map(str::to_string),
            text: block.text().map(str::to_string),
            text_type: block.text_type().map(|t| t.as_str().to_string()),
            confidence: block.confidence(),
            page: block.page(),
            row_index: block.row_index(),
            column_index: block.column_index(),
            row_span: block.row_span(),
            column_span: block.column_span(),
            entity_types: block
                .entity_types()
                .iter()
                .map(|t| t.as_str().to_string())
                .collect(),
            selection_status: block.selection_status().map(|s| s.as_str().to_string()),
            relationships: block
                .relationships()
                .iter()
                .map(|r| Relationship {
                    r#type: r.r#type().map(|t| t.as_str().to_string()),
                    ids: r.ids().to_vec(),
                })
                .collect(),
            geometry: block.geometry().map(|g| Geometry {
                bounding_box: g.bounding_box().map(|bb| BoundingBox {
                    width: bb.width(),
                    height: bb.height(),
                    left: bb.left(),
                    top: bb.top(),
                }),
            }),
        }
    }
}
