// crates/server/src/routes/sse.rs
//! Per-job status stream.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tokio_stream::StreamExt;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::jobs::job_events;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    pub job_id: Option<String>,
}

/// SSE handler that streams one job's status.
///
/// # Events
///
/// | Event name   | When emitted                                   |
/// |--------------|------------------------------------------------|
/// | `job_status` | Status differs from the last one sent          |
/// | `final`      | Job is `done`                                  |
/// | `error`      | Job is `failed`, unknown, or the store is down |
///
/// The stream terminates after `final` or `error`.
pub async fn job_stream(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StreamQuery>,
) -> ApiResult<Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>>> {
    let raw = query
        .job_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ApiError::MissingJobId)?;
    let job_id = Uuid::parse_str(raw).map_err(|_| ApiError::InvalidJobId(raw.to_string()))?;

    tracing::debug!(%job_id, "job stream opened");
    let stream = job_events(state.db.clone(), job_id, state.poll_interval)
        .map(|event| Ok::<_, Infallible>(event.to_sse_event()));

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// Build the stream router at `sse_path`.
pub fn router(sse_path: &str) -> Router<Arc<AppState>> {
    Router::new().route(sse_path, get(job_stream))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use dah_db::Database;
    use tower::ServiceExt;

    async fn get(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    async fn app() -> (Router, Database) {
        let db = Database::new_in_memory().await.unwrap();
        let state = AppState::new(db.clone());
        (router("/api/sse").with_state(state), db)
    }

    #[tokio::test]
    async fn test_missing_job_id() {
        let (app, _) = app().await;
        let (status, body) = get(app.clone(), "/api/sse").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("missing_job_id"));

        let (status, _) = get(app, "/api/sse?job_id=%20%20").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_job_id() {
        let (app, _) = app().await;
        let (status, body) = get(app, "/api/sse?job_id=abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("invalid_job_id"));
    }

    #[tokio::test]
    async fn test_unknown_job_single_error_event() {
        let (app, _) = app().await;
        let id = Uuid::new_v4();
        let (status, body) = get(app, &format!("/api/sse?job_id={id}")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.matches("event: ").count(), 1);
        assert!(body.contains("event: error"));
        assert!(body.contains(r#""error":"not_found""#));
    }

    #[tokio::test]
    async fn test_done_job_stream() {
        let (app, db) = app().await;
        let id = db.create_job(None, &[], "q").await.unwrap();
        db.set_job_done(id, "answer").await.unwrap();

        let (status, body) = get(app, &format!("/api/sse?job_id={id}")).await;
        assert_eq!(status, StatusCode::OK);
        let status_at = body.find("event: job_status").unwrap();
        let final_at = body.find("event: final").unwrap();
        assert!(status_at < final_at);
        assert!(body.contains(r#""final_text":"answer""#));
    }
}
