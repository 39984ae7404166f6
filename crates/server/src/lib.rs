// crates/server/src/lib.rs
//! dah server library.
//!
//! HTTP boundary (job creation, per-job SSE status stream), the queue worker,
//! and the process plumbing (configuration, logging) shared by the `dah` binary.

pub mod config;
pub mod error;
pub mod jobs;
pub mod logging;
pub mod routes;
pub mod state;

pub use error::*;
pub use jobs::{job_events, JobEvent, JobOutcome, ProcessError, Worker};
pub use routes::api_routes;
pub use state::AppState;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the Axum application with all routes and middleware.
///
/// This sets up:
/// - API routes (jobs, stream, health)
/// - CORS (allows any origin)
/// - Request tracing
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api_routes(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

// ============================================================================
// Integration Tests
// ============================================================================
