// crates/core/src/llm/provider.rs
//! ChatProvider trait defining the interface for chat completion services.

use async_trait::async_trait;

use super::types::{ChatMessage, LlmError};

/// A service that turns an ordered message list into one completion string.
///
/// Implementations include:
/// - `OllamaProvider`: `POST /api/chat` on an Ollama-compatible server
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Run a non-streaming chat completion.
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, LlmError>;

    /// Provider name for logging (e.g. "ollama").
    fn name(&self) -> &str;

    /// Model identifier.
    fn model(&self) -> &str;
}
