use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

use super::AgentSpec;
use crate::llm::{LlmProvider, Message};

/// Produces an agent's next message from the chat so far.
///
/// `history` is seen from the replying agent's side: its own messages carry
/// the assistant role, everything it received carries the user role.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn reply(&self, agent: &AgentSpec, history: &[Message]) -> Result<String>;
}

/// Answers through the chat model using the agent's instructions.
pub struct ModelResponder {
    provider: Arc<dyn LlmProvider>,
}

impl ModelResponder {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Responder for ModelResponder {
    async fn reply(&self, agent: &AgentSpec, history: &[Message]) -> Result<String> {
        if !agent.uses_model {
            anyhow::bail!("agent '{}' is not configured to use the model", agent.name);
        }

        let system = agent.instructions.as_deref().unwrap_or_default();
        let response = self
            .provider
            .chat(system, history)
            .await
            .with_context(|| format!("{} agent: LLM chat failed", agent.name))?;

        debug!(
            agent = %agent.name,
            provider = self.provider.name(),
            reply_len = response.message.content.len(),
            "model reply"
        );
        Ok(response.message.content)
    }
}
