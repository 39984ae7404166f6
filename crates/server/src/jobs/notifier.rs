// crates/server/src/jobs/notifier.rs
//! Polling status stream for one job.

use std::time::Duration;

use axum::response::sse::Event;
use dah_core::{JobId, JobStatus};
use dah_db::Database;
use serde_json::json;
use tokio_stream::Stream;

use crate::config::MIN_POLL_INTERVAL;

/// One message on a job's status stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEvent {
    /// The job moved to a status not yet reported on this stream.
    Status { job_id: JobId, status: JobStatus },
    /// The job finished with an answer.
    Final { job_id: JobId, final_text: String },
    /// The job id is not in the store.
    NotFound { job_id: JobId },
    /// Processing failed.
    Failed { job_id: JobId, error_text: String },
    /// The store could not be read.
    Unavailable { job_id: JobId },
}

impl JobEvent {
    /// SSE event name.
    pub fn name(&self) -> &'static str {
        match self {
            JobEvent::Status { .. } => "job_status",
            JobEvent::Final { .. } => "final",
            JobEvent::NotFound { .. } | JobEvent::Failed { .. } | JobEvent::Unavailable { .. } => {
                "error"
            }
        }
    }

    /// JSON data carried by the event.
    pub fn payload(&self) -> serde_json::Value {
        match self {
            JobEvent::Status { job_id, status } => json!({
                "job_id": job_id.to_string(),
                "status": status.as_str(),
            }),
            JobEvent::Final { job_id, final_text } => json!({
                "job_id": job_id.to_string(),
                "final_text": final_text,
            }),
            JobEvent::NotFound { job_id } => json!({
                "job_id": job_id.to_string(),
                "error": "not_found",
            }),
            JobEvent::Failed { job_id, error_text } => json!({
                "job_id": job_id.to_string(),
                "error": "job_failed",
                "error_text": error_text,
            }),
            JobEvent::Unavailable { job_id } => json!({
                "job_id": job_id.to_string(),
                "error": "store_unavailable",
            }),
        }
    }

    /// Whether the stream ends after this event.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobEvent::Status { .. })
    }

    pub fn to_sse_event(&self) -> Event {
        Event::default()
            .event(self.name())
            .data(self.payload().to_string())
    }
}

/// Stream status changes of `job_id` until it reaches a terminal event.
///
/// Each poll reads the job once. A status is reported only when it differs
/// from the last one reported. The stream ends after exactly one terminal
/// event (`Final`, `Failed`, `NotFound` or `Unavailable`). Dropping the
/// stream stops polling. Polls are never closer than [`MIN_POLL_INTERVAL`].
pub fn job_events(
    db: Database,
    job_id: JobId,
    poll_interval: Duration,
) -> impl Stream<Item = JobEvent> + Send + 'static {
    let poll_interval = poll_interval.max(MIN_POLL_INTERVAL);
    async_stream::stream! {
        let mut last_status: Option<JobStatus> = None;

        loop {
            let job = match db.get_job(job_id).await {
                Ok(Some(job)) => job,
                Ok(None) => {
                    yield JobEvent::NotFound { job_id };
                    break;
                }
                Err(e) => {
                    tracing::warn!(%job_id, error = %e, "job stream lost the store");
                    yield JobEvent::Unavailable { job_id };
                    break;
                }
            };

            if last_status != Some(job.status) {
                last_status = Some(job.status);
                yield JobEvent::Status { job_id, status: job.status };
            }

            let outcome = match (job.status, job.final_text, job.error_text) {
                (JobStatus::Done, Some(final_text), _) => Some(JobEvent::Final { job_id, final_text }),
                (JobStatus::Failed, _, Some(error_text)) => Some(JobEvent::Failed { job_id, error_text }),
                _ => None,
            };
            if let Some(event) = outcome {
                let terminal = event.is_terminal();
                yield event;
                if terminal {
                    break;
                }
            }

            tokio::time::sleep(poll_interval).await;
        }
    }
}
