//! Wire types for the chat endpoint (`/api/chat`).

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::agent::message::Message;
use crate::tools::ToolSchema;

/// Request body for a non-streaming chat call.
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [Message],
    pub stream: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<&'a [ToolSchema]>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<u32>,
}

/// Top-level chat response. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub message: ResponseMessage,

    #[serde(default)]
    pub done_reason: Option<String>,
}

/// The assistant message inside a response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,

    #[serde(default)]
    pub tool_calls: Option<Vec<WireToolCall>>,
}

/// One structured tool call entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireToolCall {
    #[serde(default)]
    pub function: Option<WireFunction>,
}

/// Function name plus arguments, either JSON-encoded text or an inline object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireFunction {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub arguments: Value,
}

impl ChatResponse {
    /// A response carrying only text.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            message: ResponseMessage {
                content: Some(content.into()),
                tool_calls: None,
            },
            done_reason: Some("stop".to_string()),
        }
    }

    /// A response requesting tool calls, each given as `(name, arguments-as-text)`.
    pub fn with_tool_calls(content: Option<&str>, calls: &[(&str, &str)]) -> Self {
        let tool_calls = calls
            .iter()
            .map(|(name, arguments)| WireToolCall {
                function: Some(WireFunction {
                    name: Some(name.to_string()),
                    arguments: json!(arguments),
                }),
            })
            .collect();

        Self {
            message: ResponseMessage {
                content: content.map(str::to_string),
                tool_calls: Some(tool_calls),
            },
            done_reason: Some("stop".to_string()),
        }
    }

    /// Non-empty assistant text, if any.
    pub fn content(&self) -> Option<&str> {
        self.message.content.as_deref().filter(|c| !c.is_empty())
    }
}
