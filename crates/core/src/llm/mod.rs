// crates/core/src/llm/mod.rs
//! Chat completion module.
//!
//! Provides the `ChatProvider` trait and the Ollama HTTP implementation the
//! worker uses to answer a job.

pub mod config;
pub mod factory;
pub mod ollama;
pub mod provider;
pub mod types;

pub use config::LlmConfig;
pub use factory::create_provider;
pub use ollama::OllamaProvider;
pub use provider::ChatProvider;
pub use types::{ChatMessage, ChatRole, LlmError};
