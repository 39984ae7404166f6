// crates/server/src/state.rs
//! Application state for the Axum server.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dah_core::JobStatus;
use dah_db::Database;

use crate::config::{AppConfig, RouteConfig, MIN_POLL_INTERVAL};

/// Shared application state accessible from all route handlers.
pub struct AppState {
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    /// Job store shared with the worker.
    pub db: Database,
    /// Sleep between store reads in the status stream.
    pub poll_interval: Duration,
    /// Configured status vocabulary; job creation refuses to run without `queued`.
    pub job_statuses: Vec<String>,
    pub routes: RouteConfig,
}

impl AppState {
    /// State with default routes, statuses, and poll interval.
    pub fn new(db: Database) -> Arc<Self> {
        Arc::new(Self {
            start_time: Instant::now(),
            db,
            poll_interval: Duration::from_millis(500),
            job_statuses: JobStatus::ALL.iter().map(|s| s.as_str().to_string()).collect(),
            routes: RouteConfig::default(),
        })
    }

    pub fn from_config(db: Database, config: &AppConfig) -> Arc<Self> {
        Arc::new(Self {
            start_time: Instant::now(),
            db,
            poll_interval: config.poll_interval.max(MIN_POLL_INTERVAL),
            job_statuses: config.job_statuses.clone(),
            routes: config.routes.clone(),
        })
    }

    pub fn accepts_status(&self, status: JobStatus) -> bool {
        self.job_statuses.iter().any(|s| s == status.as_str())
    }

    /// Get the server uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_state_accepts_every_status() {
        let db = Database::new_in_memory().await.unwrap();
        let state = AppState::new(db);
        for status in JobStatus::ALL {
            assert!(state.accepts_status(status));
        }
        assert_eq!(state.routes.job_create_path, "/api/jobs");
    }
}
