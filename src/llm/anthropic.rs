use anyhow::{Context, Result};
use async_trait::async_trait;
use llm::builder::{LLMBackend, LLMBuilder};
use llm::chat::{ChatMessage, ChatRole, MessageType};
use tokio::time::{Duration, timeout};
use tracing::{debug, warn};

use super::{LlmProvider, LlmResponse, Message, MessageRole};

const DEFAULT_MAX_TOKENS: u32 = 8192;
const API_TIMEOUT_SECS: u64 = 120;

/// Parameters for the shared LLM chat implementation
struct ChatParams<'a> {
    backend: LLMBackend,
    provider_name: &'a str,
    api_key: &'a str,
    model: &'a str,
    system: &'a str,
    messages: &'a [Message],
}

fn to_chat_messages(messages: &[Message]) -> Vec<ChatMessage> {
    messages
        .iter()
        .filter_map(|msg| {
            let role = match msg.role {
                MessageRole::User => ChatRole::User,
                MessageRole::Assistant => ChatRole::Assistant,
                // System messages handled separately
                MessageRole::System => return None,
            };
            Some(ChatMessage {
                role,
                message_type: MessageType::Text,
                content: msg.content.clone(),
            })
        })
        .collect()
}

async fn chat_with(params: ChatParams<'_>) -> Result<LlmResponse> {
    let llm = LLMBuilder::new()
        .backend(params.backend)
        .api_key(params.api_key)
        .model(params.model)
        .system(params.system)
        .max_tokens(DEFAULT_MAX_TOKENS)
        .build()
        .context("failed to build LLM client")?;

    let chat_messages = to_chat_messages(params.messages);
    debug!(
        provider = params.provider_name,
        model = params.model,
        messages = chat_messages.len(),
        "calling chat API"
    );

    let response = timeout(
        Duration::from_secs(API_TIMEOUT_SECS),
        llm.chat(&chat_messages),
    )
    .await
    .with_context(|| {
        format!(
            "{} API call timed out after {} seconds",
            params.provider_name, API_TIMEOUT_SECS
        )
    })?
    .with_context(|| format!("failed to call {} API", params.provider_name))?;

    let content = response.text().unwrap_or_else(|| {
        warn!(
            provider = params.provider_name,
            "API returned empty or missing response text"
        );
        String::new()
    });

    Ok(LlmResponse::text(content))
}

/// Anthropic LLM provider using the llm crate
pub struct AnthropicProvider {
    model: String,
    api_key: String,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider with the specified model
    pub fn new(model: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .context("ANTHROPIC_API_KEY environment variable not set")?;
        Ok(Self {
            model: model.into(),
            api_key,
        })
    }

    /// Create a provider using Claude Sonnet
    pub fn sonnet() -> Result<Self> {
        Self::new("claude-sonnet-4-20250514")
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn chat(&self, system: &str, messages: &[Message]) -> Result<LlmResponse> {
        chat_with(ChatParams {
            backend: LLMBackend::Anthropic,
            provider_name: "Anthropic",
            api_key: &self.api_key,
            model: &self.model,
            system,
            messages,
        })
        .await
    }
}

/// OpenAI LLM provider using the llm crate
pub struct OpenAIProvider {
    model: String,
    api_key: String,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider with the specified model
    pub fn new(model: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .context("OPENAI_API_KEY environment variable not set")?;
        Ok(Self {
            model: model.into(),
            api_key,
        })
    }

    /// Create a provider using GPT-4o
    pub fn gpt4o() -> Result<Self> {
        Self::new("gpt-4o")
    }
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn chat(&self, system: &str, messages: &[Message]) -> Result<LlmResponse> {
        chat_with(ChatParams {
            backend: LLMBackend::OpenAI,
            provider_name: "OpenAI",
            api_key: &self.api_key,
            model: &self.model,
            system,
            messages,
        })
        .await
    }
}
