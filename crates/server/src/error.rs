// crates/server/src/error.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use dah_db::DbError;

/// JSON body of every rejected request: `{"ok": false, "error": "<code>"}`.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: error.into(),
        }
    }
}

/// API error types that map to HTTP status codes
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("message is required")]
    MissingMessage,

    #[error("invalid uuid: {0}")]
    InvalidUuid(String),

    #[error("job status vocabulary does not contain 'queued'")]
    InvalidStatusConfig,

    #[error("job_id is required")]
    MissingJobId,

    #[error("invalid job_id: {0}")]
    InvalidJobId(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl ApiError {
    /// Stable error code sent to clients.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::MissingMessage => "missing_message",
            ApiError::InvalidUuid(_) => "invalid_uuid",
            ApiError::InvalidStatusConfig => "invalid_status_config",
            ApiError::MissingJobId => "missing_job_id",
            ApiError::InvalidJobId(_) => "invalid_job_id",
            ApiError::JobNotFound(_) => "not_found",
            ApiError::Database(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingMessage
            | ApiError::InvalidUuid(_)
            | ApiError::MissingJobId
            | ApiError::InvalidJobId(_) => StatusCode::BAD_REQUEST,
            ApiError::JobNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidStatusConfig | ApiError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::InvalidStatusConfig => {
                tracing::error!("JOB_STATUSES lacks 'queued'; refusing to create jobs");
            }
            ApiError::Database(e) => {
                tracing::error!(error = %e, "Database error");
            }
            ApiError::JobNotFound(id) => {
                tracing::debug!(job_id = %id, "Job not found");
            }
            other => {
                tracing::warn!(error = %other, "Rejected request");
            }
        }

        (status, Json(ErrorResponse::new(self.code()))).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
