mod anthropic;
mod message;
mod provider;

pub use anthropic::{AnthropicProvider, OpenAIProvider};
pub use message::{Message, MessageRole};
pub use provider::{LlmProvider, LlmResponse};
