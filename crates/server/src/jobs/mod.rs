// crates/server/src/jobs/mod.rs
//! Queue consumers.
//!
//! - `Worker`: claims queued jobs one at a time and drives them to a terminal status
//! - `job_events`: per-subscriber status stream for a single job

pub mod notifier;
pub mod worker;

pub use notifier::{job_events, JobEvent};
pub use worker::{JobOutcome, ProcessError, Worker};
