mod conversation;
mod message;
mod responder;
mod scraper;

pub use conversation::{Conversation, Participant, TERMINATE, initiate_chat};
pub use message::ConversationTurn;
pub use responder::{ModelResponder, Responder};
pub use scraper::{HttpPageSource, PageOutline, PageScraperResponder, PageSource};

/// Configuration for one conversational participant.
///
/// Agents differ only in this record; the behaviour behind a reply comes from
/// the [`Responder`] paired with the agent when a chat starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSpec {
    /// Unique within one orchestration run
    pub name: String,
    /// How many replies the agent may send on its own within one chat
    pub max_auto_replies: u32,
    /// Whether replies are produced by the chat model
    pub uses_model: bool,
    /// Replies without waiting for a human
    pub automated: bool,
    /// Role-specific system instruction
    pub instructions: Option<String>,
}

impl AgentSpec {
    /// An agent that only sends the opening message and never replies.
    pub fn coordinator(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_auto_replies: 0,
            uses_model: false,
            automated: true,
            instructions: None,
        }
    }

    /// A model-backed agent with a system instruction.
    pub fn assistant(
        name: impl Into<String>,
        max_auto_replies: u32,
        instructions: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            max_auto_replies,
            uses_model: true,
            automated: true,
            instructions: Some(instructions.into()),
        }
    }

    /// An automated agent whose replies do not come from the model.
    pub fn tool(name: impl Into<String>, max_auto_replies: u32) -> Self {
        Self {
            name: name.into(),
            max_auto_replies,
            uses_model: false,
            automated: true,
            instructions: None,
        }
    }

    /// Whether the agent may send another reply after `replies_sent` so far.
    pub fn can_auto_reply(&self, replies_sent: u32) -> bool {
        self.automated && replies_sent < self.max_auto_replies
    }
}
