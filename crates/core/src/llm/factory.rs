// crates/core/src/llm/factory.rs
//! Provider factory. Creates a ChatProvider from configuration.

use std::sync::Arc;

use super::config::LlmConfig;
use super::ollama::OllamaProvider;
use super::provider::ChatProvider;

/// Create the chat provider for the given configuration.
pub fn create_provider(config: &LlmConfig) -> Arc<dyn ChatProvider> {
    Arc::new(OllamaProvider::from_config(config))
}
