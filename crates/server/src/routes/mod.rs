// crates/server/src/routes/mod.rs
//! API route handlers for the dah server.

pub mod health;
pub mod jobs;
pub mod sse;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Create the combined API router.
///
/// Routes (paths from `AppState::routes`, defaults shown):
/// - POST /api/jobs - Queue a job
/// - GET  /api/jobs/{job_id} - JSON snapshot of a job
/// - GET  /api/sse?job_id= - SSE stream of one job's status
/// - GET  /health - Liveness plus per-status job counts
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(health::router())
        .merge(jobs::router(&state.routes.job_create_path))
        .merge(sse::router(&state.routes.sse_path))
        .with_state(state)
}
