use anyhow::Result;
use async_trait::async_trait;

use super::Message;

/// Response from an LLM
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// The message content
    pub message: Message,
}

impl LlmResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            message: Message::assistant(content),
        }
    }
}

/// Trait for LLM providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send messages to the LLM and get a response
    async fn chat(&self, system: &str, messages: &[Message]) -> Result<LlmResponse>;

    /// Get the provider name
    fn name(&self) -> &str;
}
