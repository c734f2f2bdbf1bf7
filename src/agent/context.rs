//! Conversation history for a session.
//!
//! The history always starts with exactly one system message and only ever
//! grows by appending. Every mutation goes through [`Conversation::push`].

use super::message::{Message, Role};

/// Content stored for a tool whose result flattened to nothing.
pub const EMPTY_TOOL_RESULT: &str = "(empty)";

/// Ordered, append-only message history.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Start a conversation with the given system prompt.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
        }
    }

    /// Append a message. System messages after the first are refused.
    pub fn push(&mut self, message: Message) {
        if message.role == Role::System {
            tracing::warn!("Ignoring extra system message");
            return;
        }
        self.messages.push(message);
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(Message::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(Message::assistant(content));
    }

    /// Append a tool result, substituting a placeholder for empty text.
    pub fn push_tool_result(&mut self, tool_name: &str, text: String) {
        let content = if text.is_empty() {
            EMPTY_TOOL_RESULT.to_string()
        } else {
            text
        };
        self.push(Message::tool_result(tool_name, content));
    }

    /// Full history, system message first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
