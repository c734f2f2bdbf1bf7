//! Ollama chat client (`POST {host}/api/chat`, non-streaming).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::agent::message::Message;
use crate::agent::preview;
use crate::config::Config;
use crate::error::Error;
use crate::tools::ToolSchema;
use crate::Result;

use super::{ChatClient, ChatRequest, ChatResponse};

/// HTTP client for an Ollama-compatible chat endpoint.
#[derive(Clone)]
pub struct OllamaClient {
    host: String,
    model: String,
    timeout: Duration,
    unload_timeout: Duration,
    client: Client,
}

impl OllamaClient {
    /// Create a client for `host` (base URL, no trailing route) and `model`.
    pub fn new(host: &str, model: &str) -> Self {
        Self {
            host: host.trim_end_matches('/').to_string(),
            model: model.to_string(),
            timeout: Duration::from_secs(120),
            unload_timeout: Duration::from_secs(10),
            client: Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.ollama_host, &config.model)
            .with_timeout(Duration::from_secs(config.request_timeout_secs))
            .with_unload_timeout(Duration::from_secs(config.unload_timeout_secs))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_unload_timeout(mut self, timeout: Duration) -> Self {
        self.unload_timeout = timeout;
        self
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.host)
    }

    async fn post(&self, request: &ChatRequest<'_>, timeout: Duration) -> Result<ChatResponse> {
        let response = self
            .client
            .post(self.chat_url())
            .timeout(timeout)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::Chat(format!("{}: {}", status, error_text)));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl ChatClient for OllamaClient {
    async fn chat(&self, messages: &[Message], tools: &[ToolSchema]) -> Result<ChatResponse> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            stream: false,
            tools: (!tools.is_empty()).then_some(tools),
            keep_alive: None,
        };

        debug!(
            "chat request: msgs={}, tools={}",
            messages.len(),
            tools.len()
        );
        let response = self.post(&request, self.timeout).await?;
        debug!(
            "chat response: done_reason={:?}, content_preview='{}'",
            response.done_reason,
            preview(response.message.content.as_deref().unwrap_or_default())
        );

        Ok(response)
    }

    async fn unload(&self) -> Result<()> {
        let messages = [Message::user("(cleanup)")];
        let request = ChatRequest {
            model: &self.model,
            messages: &messages,
            stream: false,
            tools: None,
            keep_alive: Some(0),
        };

        debug!("unloading model {}", self.model);
        self.post(&request, self.unload_timeout).await.map(|_| ())
    }

    fn model(&self) -> &str {
        &self.model
    }
}
