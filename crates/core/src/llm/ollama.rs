// crates/core/src/llm/ollama.rs
//! Ollama provider: `POST {base}/api/chat` with `stream: false`.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::config::LlmConfig;
use super::provider::ChatProvider;
use super::types::{ChatMessage, LlmError};

/// Chat provider backed by an Ollama-compatible HTTP server.
pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    options: Option<Value>,
    timeout_secs: u64,
}

impl OllamaProvider {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self::from_config(&LlmConfig::new(base_url, model))
    }

    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            options: config.options.clone(),
            timeout_secs: config.timeout_secs,
        }
    }

    fn payload(&self, messages: &[ChatMessage]) -> Value {
        let mut payload = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "stream": false,
        });
        if let Some(options) = &self.options {
            payload["options"] = options.clone();
        }
        payload
    }
}

/// Pull `message.content` out of an `/api/chat` response body.
fn extract_content(data: &Value) -> Result<String, LlmError> {
    data.get("message")
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| LlmError::InvalidFormat(format!("Unexpected Ollama response shape: {data}")))
}

#[async_trait]
impl ChatProvider for OllamaProvider {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let url = format!("{}/api/chat", self.base_url);
        tracing::debug!(model = %self.model, messages = messages.len(), "ollama chat request");

        let resp = self
            .client
            .post(&url)
            .timeout(Duration::from_secs(self.timeout_secs))
            .json(&self.payload(messages))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(self.timeout_secs)
                } else {
                    LlmError::RequestFailed(e.to_string())
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let data: Value = resp
            .json()
            .await
            .map_err(|e| LlmError::InvalidFormat(e.to_string()))?;
        extract_content(&data)
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
