// crates/server/src/routes/jobs.rs
//! Job creation and lookup.
//!
//! - `POST <create_path>`: Queue a new job
//! - `GET <create_path>/{job_id}`: JSON snapshot of one job

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use dah_core::{Job, JobId, JobStatus};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct CreateJobResponse {
    pub ok: bool,
    pub job_id: JobId,
}

#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct JobSnapshotResponse {
    pub ok: bool,
    pub job: Job,
}

/// Validated create request.
#[derive(Debug, PartialEq, Eq)]
struct NewJob {
    space_id: Option<Uuid>,
    selected_page_ids: Vec<Uuid>,
    message: String,
}

fn parse_uuid(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::InvalidUuid(raw.to_string()))
}

/// Validate a create body. A body that is not a JSON object counts as `{}`.
///
/// `message` is checked before any id.
fn parse_new_job(body: &[u8]) -> Result<NewJob, ApiError> {
    let body: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
    let field = |name: &str| body.get(name).filter(|v| !v.is_null());

    let message = field("message")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();
    if message.is_empty() {
        return Err(ApiError::MissingMessage);
    }

    let space_id = match field("space_id") {
        None => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(Value::String(s)) => Some(parse_uuid(s)?),
        Some(other) => return Err(ApiError::InvalidUuid(other.to_string())),
    };

    let selected_page_ids = match field("selected_page_ids") {
        None => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => parse_uuid(s),
                other => Err(ApiError::InvalidUuid(other.to_string())),
            })
            .collect::<Result<_, _>>()?,
        Some(other) => return Err(ApiError::InvalidUuid(other.to_string())),
    };

    Ok(NewJob {
        space_id,
        selected_page_ids,
        message: message.to_string(),
    })
}

/// `POST <create_path>`: validate and enqueue.
pub async fn create_job(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<Json<CreateJobResponse>> {
    let new_job = parse_new_job(&body)?;

    if !state.accepts_status(JobStatus::Queued) {
        return Err(ApiError::InvalidStatusConfig);
    }

    let job_id = state
        .db
        .create_job(new_job.space_id, &new_job.selected_page_ids, &new_job.message)
        .await?;
    tracing::info!(%job_id, pages = new_job.selected_page_ids.len(), "job queued");

    Ok(Json(CreateJobResponse { ok: true, job_id }))
}

/// `GET <create_path>/{job_id}`: current state of a job, for clients that
/// cannot hold an event stream open.
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobSnapshotResponse>> {
    let id = Uuid::parse_str(job_id.trim()).map_err(|_| ApiError::InvalidJobId(job_id.clone()))?;
    let job = state
        .db
        .get_job(id)
        .await?
        .ok_or(ApiError::JobNotFound(job_id))?;
    Ok(Json(JobSnapshotResponse { ok: true, job }))
}

/// Build the jobs router rooted at `create_path`.
pub fn router(create_path: &str) -> Router<Arc<AppState>> {
    let base = create_path.trim_end_matches('/');
    Router::new()
        .route(create_path, post(create_job))
        .route(&format!("{base}/{{job_id}}"), get(get_job))
}
