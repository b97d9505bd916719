use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use blob_store::BlobStoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerErr {
    #[error(transparent)]
    Store(#[from] BlobStoreError),

    #[error("Failed to open the configured backend: {0}")]
    Backend(String),
}

impl ResponseError for ServerErr {
    fn status_code(&self) -> StatusCode {
        match self {
            ServerErr::Store(BlobStoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            ServerErr::Store(BlobStoreError::InvalidArgument(_)) => StatusCode::BAD_REQUEST,
            ServerErr::Store(BlobStoreError::BackendUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ServerErr::Store(BlobStoreError::CorruptedBlob { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerErr::Store(BlobStoreError::ReadAfterClose(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerErr::Backend(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ServerErr::Store(BlobStoreError::CorruptedBlob { blob_id, reason }) = self {
            tracing::error!("refusing to serve {}: {}", blob_id, reason);
        }
        HttpResponse::build(self.status_code()).body(self.to_string())
    }
}
