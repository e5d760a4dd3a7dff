use serde::{Deserialize, Serialize};

/// One message sent from one agent to another within a chat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Name of the sending agent
    pub from_agent: String,
    /// Name of the receiving agent
    pub to_agent: String,
    /// Message text
    pub message: String,
}

impl ConversationTurn {
    pub fn new(
        from_agent: impl Into<String>,
        to_agent: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            from_agent: from_agent.into(),
            to_agent: to_agent.into(),
            message: message.into(),
        }
    }
}
