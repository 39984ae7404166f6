// crates/server/src/logging.rs
//! Tracing subscriber setup: console always, daily-rotated files in prod.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{Builder, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::{LogConfig, Mode};

/// Dependencies that log every request or statement at `info`.
const NOISY: &[&str] = &["hyper", "hyper_util", "reqwest", "sqlx", "h2"];

/// Filter directives for `level`, with noisy crates capped at `warn`.
fn directives(config: &LogConfig) -> String {
    let mut parts = vec![config.level.as_directive().to_string()];
    parts.extend(NOISY.iter().map(|target| format!("{target}=warn")));
    parts.join(",")
}

/// `RUST_LOG` wins; otherwise `LOG_LEVEL`.
fn env_filter(config: &LogConfig) -> anyhow::Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let directives = directives(config);
    EnvFilter::try_new(&directives)
        .map_err(|e| anyhow::anyhow!("Invalid tracing filter '{directives}': {e}"))
}

/// Install the global subscriber.
///
/// Returns the file writer's guard when file logging is on; buffered lines
/// are flushed when it drops, so hold it for the life of the process.
pub fn init(config: &LogConfig, service: &str) -> anyhow::Result<Option<WorkerGuard>> {
    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_filter(env_filter(config)?);

    let (file_layer, guard) = if config.mode == Mode::Prod && config.to_file {
        std::fs::create_dir_all(&config.dir)?;
        let appender = Builder::new()
            .rotation(Rotation::DAILY)
            .filename_prefix(service)
            .filename_suffix("log")
            .max_log_files(config.keep_days.max(1))
            .build(&config.dir)?;
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_writer(writer)
            .with_filter(env_filter(config)?);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    tracing::debug!(
        level = config.level.as_directive(),
        file = guard.is_some(),
        "logging initialized"
    );
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;
    use std::path::PathBuf;

    fn config(level: LogLevel) -> LogConfig {
        LogConfig {
            mode: Mode::Dev,
            level,
            to_file: false,
            dir: PathBuf::from("/tmp"),
            keep_days: 14,
        }
    }

    #[test]
    fn test_directives_cap_noisy_crates() {
        let d = directives(&config(LogLevel::Debug));
        assert!(d.starts_with("debug,"));
        assert!(d.contains("sqlx=warn"));
        assert!(d.contains("hyper=warn"));
        assert!(EnvFilter::try_new(&d).is_ok());
    }
}
