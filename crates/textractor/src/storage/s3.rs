use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

use super::{ObjectStore, ObjectStoreError};
use crate::error::describe_sdk_error;
use crate::sanitize::redact_key;

#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    #[tracing::instrument(skip(self, key, body), fields(object = redact_key(key), bytes = body.len()))]
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ObjectStoreError> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| ObjectStoreError::Request(describe_sdk_error(&e)))?;
        Ok(())
    }

    #[tracing::instrument(skip(self, key), fields(object = redact_key(key)))]
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    ObjectStoreError::NotFound {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    }
                } else {
                    ObjectStoreError::Request(describe_sdk_error(&e))
                }
            })?;

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| ObjectStoreError::Request(e.to_string()))?;
        Ok(bytes.into_bytes().to_vec())
    }
}
