//! Durable verification record storage.
//!
//! Records are append-only: one write per verification attempt, never
//! updated in place. The registration-number secondary index must simply
//! omit records that have no number.

mod dynamodb;
mod memory;

pub use dynamodb::DynamoRecordStore;
pub use memory::MemoryRecordStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::VerificationRecord;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record write failed: {0}")]
    Write(String),

    #[error("record serialization failed: {0}")]
    Serialization(String),

    #[error("record store configuration error: {0}")]
    Configuration(String),
}

/// Durable record store keyed by verification id.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn put(&self, record: &VerificationRecord) -> Result<(), StoreError>;
}
