pub mod agents;
mod builder;
pub mod config;
mod ducky;
mod error;
pub mod llm;
pub mod persist;
pub mod pipeline;
pub mod prompts;

pub use agents::{AgentSpec, HttpPageSource, PageSource, Responder};
pub use builder::DuckyBuilder;
pub use config::{DuckyConfig, PromptServiceConfig};
pub use ducky::Ducky;
pub use error::DuckyError;
pub use llm::{AnthropicProvider, LlmProvider, LlmResponse, Message, MessageRole, OpenAIProvider};
pub use persist::WrittenFile;
pub use pipeline::{RunPhase, ScrapePipeline, ScrapeRun, Stage, WorkResult};
pub use prompts::{
    CodeRevision, DefaultTemplates, RemoteTemplateSource, StaticTemplates, TemplateSource,
};
