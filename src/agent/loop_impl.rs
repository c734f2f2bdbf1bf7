//! Agent loop - one user turn of ask / extract / invoke hops

use tracing::{debug, info, warn};
use crate::Result;
use crate::error::Error;
use crate::config::{Config, ToolErrorPolicy};
use crate::tools::{invoke, ToolProvider, ToolSchema};
use super::context::Conversation;
use super::extract::extract_tool_calls;
use super::llm::ChatClient;
use super::message::ToolCallRequest;
use super::preview;

/// Why a turn stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The model answered without requesting tools.
    Completed,
    /// Every allowed hop requested tools.
    HopLimit,
}

/// Summary of one turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// Last assistant text appended during this turn.
    pub answer: Option<String>,
    /// Chat requests issued.
    pub hops: usize,
    /// Tool calls executed.
    pub tool_calls: usize,
    pub stop: StopReason,
}

/// The agent loop drives one turn through chat requests and tool calls.
///
/// Tool calls run one after another: each appends to the shared history that
/// the next chat request reads in full.
pub struct AgentLoop<C: ChatClient> {
    client: C,
    max_hops: usize,
    tool_errors: ToolErrorPolicy,
}

impl<C: ChatClient> AgentLoop<C> {
    /// Create a new agent loop
    pub fn new(client: C, max_hops: usize) -> Self {
        Self {
            client,
            max_hops,
            tool_errors: ToolErrorPolicy::Abort,
        }
    }

    pub fn from_config(client: C, config: &Config) -> Self {
        Self::new(client, config.max_hops).with_tool_errors(config.tool_errors)
    }

    pub fn with_tool_errors(mut self, policy: ToolErrorPolicy) -> Self {
        self.tool_errors = policy;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Run one turn. The user message must already be the newest entry of
    /// `conversation`.
    pub async fn run<P>(
        &self,
        conversation: &mut Conversation,
        tools: &mut P,
        schema: &[ToolSchema],
    ) -> Result<TurnOutcome>
    where
        P: ToolProvider + ?Sized,
    {
        let mut outcome = TurnOutcome {
            answer: None,
            hops: 0,
            tool_calls: 0,
            stop: StopReason::HopLimit,
        };

        for hop in 1..=self.max_hops {
            debug!("hop={} -> ask {}", hop, self.client.model());
            outcome.hops = hop;

            let response = self.client.chat(conversation.messages(), schema).await?;

            if let Some(content) = response.content() {
                debug!("assistant draft: '{}'", preview(content));
                conversation.push_assistant(content);
                outcome.answer = Some(content.to_string());
            }

            let calls = extract_tool_calls(&response);
            if calls.is_empty() {
                debug!("no tool calls -> finish turn");
                outcome.stop = StopReason::Completed;
                return Ok(outcome);
            }

            for call in &calls {
                let text = self.execute_tool(tools, call).await?;
                conversation.push_tool_result(&call.name, text);
                outcome.tool_calls += 1;
            }
        }

        info!("hop limit ({}) reached, ending turn", self.max_hops);
        Ok(outcome)
    }

    async fn execute_tool<P>(&self, tools: &mut P, call: &ToolCallRequest) -> Result<String>
    where
        P: ToolProvider + ?Sized,
    {
        match invoke(tools, call).await {
            Ok(text) => Ok(text),
            Err(e) => match self.tool_errors {
                ToolErrorPolicy::Abort => Err(e),
                ToolErrorPolicy::Report => {
                    warn!("Tool {} failed, reporting to model: {}", call.name, e);
                    let message = match e {
                        Error::Tool(message) => message,
                        other => other.to_string(),
                    };
                    Ok(format!("Error: {}", message))
                }
            },
        }
    }
}
