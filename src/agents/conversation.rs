use anyhow::{Context, Result};
use tokio::time::{Duration, sleep};
use tracing::{debug, info};

use super::{AgentSpec, ConversationTurn, Responder};
use crate::llm::Message;

/// A reply ending in this token closes the chat.
pub const TERMINATE: &str = "TERMINATE";

/// One side of a two-party chat.
#[derive(Clone, Copy)]
pub struct Participant<'a> {
    pub spec: &'a AgentSpec,
    pub responder: Option<&'a dyn Responder>,
}

impl<'a> Participant<'a> {
    pub fn new(spec: &'a AgentSpec, responder: &'a dyn Responder) -> Self {
        Self {
            spec,
            responder: Some(responder),
        }
    }

    /// A participant that never replies on its own.
    pub fn silent(spec: &'a AgentSpec) -> Self {
        Self {
            spec,
            responder: None,
        }
    }
}

/// The turns of a single chat, in order.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    pub turns: Vec<ConversationTurn>,
}

impl Conversation {
    /// The last message `agent` sent in this chat.
    pub fn last_message_from(&self, agent: &str) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.from_agent == agent)
            .map(|t| t.message.as_str())
    }

    /// The chat as `agent` sees it: its own turns are assistant messages.
    fn history_for(&self, agent: &str) -> Vec<Message> {
        self.turns
            .iter()
            .map(|t| {
                if t.from_agent == agent {
                    Message::assistant(&t.message)
                } else {
                    Message::user(&t.message)
                }
            })
            .collect()
    }
}

/// Run a chat that `initiator` opens with `message`.
///
/// The two sides then take turns replying. The chat ends when the side whose
/// turn it is has no responder or has used up its auto-reply budget, or when a
/// reply ends with [`TERMINATE`]. Every reply is bounded by a budget, so the
/// chat always ends.
pub async fn initiate_chat(
    initiator: Participant<'_>,
    recipient: Participant<'_>,
    message: &str,
) -> Result<Conversation> {
    let mut conversation = Conversation {
        turns: vec![ConversationTurn::new(
            &initiator.spec.name,
            &recipient.spec.name,
            message,
        )],
    };

    let sides = [initiator, recipient];
    let mut replies_sent = [0u32; 2];
    let mut speaker = 1;

    loop {
        let current = sides[speaker];
        let other = sides[1 - speaker];

        let Some(responder) = current.responder else {
            debug!(agent = %current.spec.name, "no responder, chat ends");
            break;
        };
        if !current.spec.can_auto_reply(replies_sent[speaker]) {
            debug!(
                agent = %current.spec.name,
                replies = replies_sent[speaker],
                "auto-reply budget used, chat ends"
            );
            break;
        }

        // Rate limiting to avoid hammering the API
        if conversation.turns.len() > 1 {
            sleep(Duration::from_millis(100)).await;
        }

        let history = conversation.history_for(&current.spec.name);
        let reply = responder
            .reply(current.spec, &history)
            .await
            .with_context(|| format!("{} agent failed to reply", current.spec.name))?;
        replies_sent[speaker] += 1;

        let (content, terminate) = strip_terminate(&reply);
        if !content.is_empty() {
            conversation.turns.push(ConversationTurn::new(
                &current.spec.name,
                &other.spec.name,
                content,
            ));
        }
        if terminate {
            debug!(agent = %current.spec.name, "termination requested");
            break;
        }

        speaker = 1 - speaker;
    }

    info!(
        initiator = %initiator.spec.name,
        recipient = %recipient.spec.name,
        turns = conversation.turns.len(),
        "chat finished"
    );
    Ok(conversation)
}

fn strip_terminate(reply: &str) -> (&str, bool) {
    let trimmed = reply.trim_end();
    match trimmed.strip_suffix(TERMINATE) {
        Some(rest) => (rest.trim_end(), true),
        None => (trimmed, false),
    }
}
