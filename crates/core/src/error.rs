// crates/core/src/error.rs
use thiserror::Error;
use uuid::Uuid;

/// Errors raised while resolving a page through the content fetch service.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("content service request failed for page {page_id}: {source}")]
    Transport {
        page_id: Uuid,
        #[source]
        source: reqwest::Error,
    },

    #[error("content service returned HTTP {status} for page {page_id}")]
    Status { page_id: Uuid, status: u16 },

    #[error("page {page_id} not found in content service")]
    NotFound { page_id: Uuid },

    #[error("content service response for page {page_id} is malformed: {message}")]
    Malformed { page_id: Uuid, message: String },
}

/// A status string read back from storage that is not a known job status.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown job status: {0}")]
pub struct UnknownStatus(pub String);
