//! Agent module: the tool-calling turn loop.
//!
//! This module contains:
//! - Message types and the append-only [`Conversation`]
//! - Chat client trait and the Ollama implementation
//! - Tool call extraction from raw responses
//! - The agent loop that drives one user turn

mod context;
mod extract;
mod loop_impl;
mod message;

pub mod llm;

pub use context::{Conversation, EMPTY_TOOL_RESULT};
pub use extract::extract_tool_calls;
pub use llm::{ChatClient, ChatResponse, OllamaClient};
pub use loop_impl::{AgentLoop, StopReason, TurnOutcome};
pub use message::{Message, Role, ToolCallRequest};

/// Longest text preview written to debug logs.
const PREVIEW_CHARS: usize = 120;

/// Single-line, length-capped preview for logs.
pub(crate) fn preview(text: &str) -> String {
    text.chars()
        .take(PREVIEW_CHARS)
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_is_single_line_and_capped() {
        let long = "a\nb".repeat(100);
        let p = preview(&long);
        assert_eq!(p.chars().count(), PREVIEW_CHARS);
        assert!(!p.contains('\n'));
    }
}
