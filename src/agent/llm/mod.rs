//! Chat endpoint abstraction.
//!
//! This module provides:
//! - [`ChatClient`] trait, the seam between the agent loop and the endpoint
//! - [`OllamaClient`], the HTTP implementation for `/api/chat`
//! - Wire types for requests and raw responses

mod types;

use async_trait::async_trait;

use crate::tools::ToolSchema;
use crate::Result;

pub use types::*;

pub mod ollama;

pub use ollama::OllamaClient;

use super::message::Message;

/// Chat transport: one synchronous request per hop.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Send the full history (and tool schemas, when any) and return the raw response.
    async fn chat(&self, messages: &[Message], tools: &[ToolSchema]) -> Result<ChatResponse>;

    /// Ask the endpoint to release the model. Called once at shutdown.
    async fn unload(&self) -> Result<()> {
        Ok(())
    }

    /// Model identifier sent with each request.
    fn model(&self) -> &str;
}

/// Scripted chat client for testing.
#[cfg(test)]
pub struct ScriptedChatClient {
    responses: std::sync::Mutex<std::collections::VecDeque<ChatResponse>>,
    requests: std::sync::Mutex<Vec<RecordedRequest>>,
    fallback: Option<ChatResponse>,
    unloads: std::sync::atomic::AtomicUsize,
}

/// What the scripted client saw on one call.
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub messages: Vec<Message>,
    pub tool_count: usize,
}

#[cfg(test)]
impl ScriptedChatClient {
    /// Replay the given responses in order; error once exhausted.
    pub fn new(responses: Vec<ChatResponse>) -> Self {
        Self {
            responses: std::sync::Mutex::new(responses.into()),
            requests: std::sync::Mutex::new(Vec::new()),
            fallback: None,
            unloads: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Answer every request with the same response.
    pub fn repeating(response: ChatResponse) -> Self {
        let mut client = Self::new(vec![]);
        client.fallback = Some(response);
        client
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn unload_count(&self) -> usize {
        self.unloads.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl ChatClient for ScriptedChatClient {
    async fn chat(&self, messages: &[Message], tools: &[ToolSchema]) -> Result<ChatResponse> {
        self.requests.lock().unwrap().push(RecordedRequest {
            messages: messages.to_vec(),
            tool_count: tools.len(),
        });

        let next = self.responses.lock().unwrap().pop_front();
        next.or_else(|| self.fallback.clone())
            .ok_or_else(|| crate::error::Error::Chat("No more scripted responses".to_string()))
    }

    async fn unload(&self) -> Result<()> {
        self.unloads.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Err(crate::error::Error::Chat("endpoint already gone".to_string()))
    }

    fn model(&self) -> &str {
        "scripted-model"
    }
}
