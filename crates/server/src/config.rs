// crates/server/src/config.rs
//! Process configuration read from the environment once at startup.

use std::path::PathBuf;
use std::time::Duration;

use dah_core::llm::LlmConfig;
use thiserror::Error;

/// Lower bound on every poll sleep, so a zero or tiny setting cannot
/// busy-loop the shared store.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8100;
const DEFAULT_JOB_CREATE_PATH: &str = "/api/jobs";
const DEFAULT_SSE_PATH: &str = "/api/sse";
const DEFAULT_JOB_STATUSES: &str = "queued,running,done,failed";
const DEFAULT_CONTENT_TIMEOUT_SECS: u64 = 20;
const DEFAULT_CHAT_TIMEOUT_SECS: u64 = 180;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required (env)")]
    Missing(&'static str),

    #[error("{var} is invalid: {message}")]
    Invalid { var: &'static str, message: String },
}

/// Route paths for the HTTP boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteConfig {
    pub job_create_path: String,
    pub sse_path: String,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            job_create_path: DEFAULT_JOB_CREATE_PATH.into(),
            sse_path: DEFAULT_SSE_PATH.into(),
        }
    }
}

/// `dev` logs to the console only; `prod` may also log to files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Lenient parse: unknown values fall back to `Info`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ALL" | "DEBUG" => LogLevel::Debug,
            "WARN" | "WARNING" => LogLevel::Warn,
            "ERROR" | "CRITICAL" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }

    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub mode: Mode,
    pub level: LogLevel,
    pub to_file: bool,
    pub dir: PathBuf,
    pub keep_days: usize,
}

/// Everything the HTTP server and the store need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_url: String,
    pub host: String,
    pub port: u16,
    pub routes: RouteConfig,
    pub poll_interval: Duration,
    pub job_statuses: Vec<String>,
    pub logging: LogConfig,
}

/// Collaborator endpoints; only the worker role needs them.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub content_base_url: String,
    /// Per-page fetch timeout.
    pub content_timeout: Duration,
    pub llm: LlmConfig,
}

/// Source of configuration values. `std::env::var` in production, a map in
/// tests.
pub trait Lookup {
    fn get(&self, key: &str) -> Option<String>;
}

impl<F> Lookup for F
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        self(key)
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Trimmed, non-empty value.
fn read(env: &impl Lookup, key: &str) -> Option<String> {
    env.get(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn read_or(env: &impl Lookup, key: &str, default: &str) -> String {
    read(env, key).unwrap_or_else(|| default.to_string())
}

fn require(env: &impl Lookup, key: &'static str) -> Result<String, ConfigError> {
    read(env, key).ok_or(ConfigError::Missing(key))
}

fn parse_num<T: std::str::FromStr>(
    env: &impl Lookup,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match read(env, key) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var: key,
            message: e.to_string(),
        }),
        None => Ok(default),
    }
}

/// Clamp a millisecond setting to [`MIN_POLL_INTERVAL`].
pub fn poll_interval_from_ms(ms: u64) -> Duration {
    Duration::from_millis(ms).max(MIN_POLL_INTERVAL)
}

fn route_path(env: &impl Lookup, key: &'static str, default: &str) -> Result<String, ConfigError> {
    let path = read_or(env, key, default);
    if !path.starts_with('/') {
        return Err(ConfigError::Invalid {
            var: key,
            message: format!("route path must start with '/': {path}"),
        });
    }
    Ok(path)
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&env_lookup)
    }

    pub fn from_lookup(env: &impl Lookup) -> Result<Self, ConfigError> {
        let job_statuses = read_or(env, "JOB_STATUSES", DEFAULT_JOB_STATUSES)
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        let mode = match read_or(env, "MODE", "dev").to_ascii_lowercase().as_str() {
            "prod" => Mode::Prod,
            _ => Mode::Dev,
        };

        Ok(Self {
            db_url: require(env, "DAH_DB_URL")?,
            host: read_or(env, "BACKEND_LISTEN_HOST", DEFAULT_HOST),
            port: parse_num(env, "BACKEND_LISTEN_PORT", DEFAULT_PORT)?,
            routes: RouteConfig {
                job_create_path: route_path(env, "JOB_CREATE_PATH", DEFAULT_JOB_CREATE_PATH)?,
                sse_path: route_path(env, "SSE_PATH", DEFAULT_SSE_PATH)?,
            },
            poll_interval: poll_interval_from_ms(parse_num(
                env,
                "WORKER_POLL_INTERVAL_MS",
                DEFAULT_POLL_INTERVAL_MS,
            )?),
            job_statuses,
            logging: LogConfig {
                mode,
                level: LogLevel::parse(&read_or(env, "LOG_LEVEL", "INFO")),
                to_file: read_or(env, "LOG_TO_FILE", "1") == "1",
                dir: PathBuf::from(read_or(env, "LOG_DIR", "/var/log/app")),
                keep_days: parse_num(env, "LOG_KEEP_DAYS", 14usize)?,
            },
        })
    }
}

impl WorkerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&env_lookup)
    }

    pub fn from_lookup(env: &impl Lookup) -> Result<Self, ConfigError> {
        let content_base_url = require(env, "DOCMOST_FETCHER_INTERNAL_BASE_URL")?;
        let mut llm = LlmConfig::new(require(env, "OLLAMA_BASE_URL")?, require(env, "OLLAMA_MODEL")?);
        llm.timeout_secs = parse_num(env, "OLLAMA_TIMEOUT_SECS", DEFAULT_CHAT_TIMEOUT_SECS)?;

        if let Some(raw) = read(env, "OLLAMA_OPTIONS_JSON") {
            let options: serde_json::Value =
                serde_json::from_str(&raw).map_err(|e| ConfigError::Invalid {
                    var: "OLLAMA_OPTIONS_JSON",
                    message: e.to_string(),
                })?;
            llm.options = Some(options);
        }

        Ok(Self {
            content_base_url,
            content_timeout: Duration::from_secs(parse_num(
                env,
                "CONTENT_TIMEOUT_SECS",
                DEFAULT_CONTENT_TIMEOUT_SECS,
            )?),
            llm,
        })
    }
}
