//! Blob storage for source images.
//!
//! The stored image key is the only durable link between the extraction and
//! matching stages, so the write happens before any recognition runs.

mod memory;
mod s3;

pub use memory::MemoryBlobStore;
pub use s3::S3BlobStore;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("blob write failed: {0}")]
    Write(String),

    #[error("blob store configuration error: {0}")]
    Configuration(String),
}

/// Content storage addressed by key.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<(), BlobError>;
}
