use std::error::Error as StdError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BlobStoreError>;

#[derive(Debug, Error)]
pub enum BlobStoreError {
    #[error("blob {0} not found")]
    NotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("operation on closed handle for blob {0}")]
    ReadAfterClose(String),

    #[error("backend unavailable: {0}")]
    BackendUnavailable(#[source] Box<dyn StdError + Send + Sync>),

    #[error("blob {blob_id} is corrupted: {reason}")]
    CorruptedBlob { blob_id: String, reason: String },
}

impl BlobStoreError {
    pub(crate) fn corrupted(blob_id: &str, reason: impl Into<String>) -> Self {
        BlobStoreError::CorruptedBlob {
            blob_id: blob_id.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<Box<dyn StdError + Send + Sync>> for BlobStoreError {
    fn from(e: Box<dyn StdError + Send + Sync>) -> Self {
        BlobStoreError::BackendUnavailable(e)
    }
}
