use thiserror::Error;

use crate::blob::BlobError;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// The request was malformed before any processing began.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("blob store error: {0}")]
    BlobStore(#[from] BlobError),

    #[error("record store error: {0}")]
    RecordStore(#[from] StoreError),

    /// The matching stage could not be invoked or did not complete.
    #[error("matching stage unavailable: {0}")]
    MatchingUnavailable(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
