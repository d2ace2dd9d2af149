//! Object storage for uploaded documents and analysis results.

mod memory;
mod s3;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::{MemoryObjectStore, StoredObject};
pub use s3::S3ObjectStore;

#[derive(Error, Debug)]
pub enum ObjectStoreError {
    #[error("Object s3://{bucket}/{key} not found")]
    NotFound { bucket: String, key: String },

    #[error("{0}")]
    Request(String),

    #[error("Object store lock poisoned")]
    LockPoisoned,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ObjectStoreError>;

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, ObjectStoreError>;
}
