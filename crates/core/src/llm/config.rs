// crates/core/src/llm/config.rs
//! Chat provider configuration types.

/// Configuration for the chat completion service.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    /// Forwarded verbatim as the request's `options` object.
    pub options: Option<serde_json::Value>,
    pub timeout_secs: u64,
}

impl LlmConfig {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            options: None,
            timeout_secs: 180,
        }
    }
}
