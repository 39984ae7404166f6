// crates/server/src/main.rs
//! dah binary.
//!
//! `dah serve` runs the HTTP API, `dah worker` runs the queue consumer, and
//! `dah all` (the default) runs both against one store handle.

use std::net::{IpAddr, SocketAddr};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dah_db::Database;
use dah_server::config::{AppConfig, WorkerConfig};
use dah_server::{create_app, logging, AppState, Worker};

#[derive(Debug, Parser)]
#[command(name = "dah", version, about = "Document-assist job queue")]
struct Cli {
    #[command(subcommand)]
    role: Option<Role>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
enum Role {
    /// HTTP API only
    Serve,
    /// Queue worker only
    Worker,
    /// API and worker in one process
    All,
}

impl Role {
    fn serves(self) -> bool {
        matches!(self, Role::Serve | Role::All)
    }

    fn works(self) -> bool {
        matches!(self, Role::Worker | Role::All)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

async fn serve(db: Database, config: &AppConfig) -> Result<()> {
    let ip = config
        .host
        .parse::<IpAddr>()
        .with_context(|| format!("BACKEND_LISTEN_HOST is not an IP address: {}", config.host))?;
    let addr = SocketAddr::new(ip, config.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    let app = create_app(AppState::from_config(db, config));
    tracing::info!(
        %addr,
        create = %config.routes.job_create_path,
        sse = %config.routes.sse_path,
        "server listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn work(worker: Worker) -> Result<()> {
    match worker.run_forever().await {
        Ok(never) => match never {},
        Err(e) => Err(anyhow::Error::new(e).context("worker stopped on a store error")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let role = Cli::parse().role.unwrap_or(Role::All);
    let config = AppConfig::from_env()?;
    let _log_guard = logging::init(&config.logging, "dah")?;

    // Collaborator settings are only required where they are used.
    let worker_config = if role.works() {
        Some(WorkerConfig::from_env()?)
    } else {
        None
    };

    let db = Database::connect(&config.db_url).await?;
    tracing::info!(?role, db = %config.db_url, "dah v{} starting", env!("CARGO_PKG_VERSION"));

    let worker = worker_config.map(|wc| {
        Worker::from_config(db.clone(), &wc).with_poll_interval(config.poll_interval)
    });

    let result = match (role.serves(), worker) {
        (true, Some(worker)) => {
            tokio::select! {
                r = serve(db.clone(), &config) => r,
                r = work(worker) => r,
            }
        }
        (true, None) => serve(db.clone(), &config).await,
        (false, Some(worker)) => {
            tokio::select! {
                r = work(worker) => r,
                _ = shutdown_signal() => Ok(()),
            }
        }
        (false, None) => Ok(()),
    };

    db.close().await;
    tracing::info!("dah stopped");
    result
}
