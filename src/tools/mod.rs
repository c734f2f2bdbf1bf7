//! Tools module: both ends of the tool protocol.
//!
//! The bridge side sees tools through [`ToolProvider`]: discover
//! [`ToolDescriptor`]s once, convert them to function schemas for the chat
//! endpoint, and invoke them by name. The `toolbridge-tools` server side
//! implements individual capabilities with the [`Tool`] trait and serves them
//! from a [`ToolRunner`].

mod clock;
mod content;
mod filesystem;
mod invoker;
mod registry;
mod runner;

pub use clock::GetTimeTool;
pub use content::{content_to_text, ResultContent, ToolCallResult};
pub use filesystem::{ListDirTool, ReadTextTool};
pub use invoker::invoke;
pub use registry::{build_tools_schema, FunctionSchema, ToolSchema};
pub use runner::ToolRunner;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use crate::Result;

/// A tool as advertised by the tool-serving process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
}

/// Client-side view of a tool-serving process.
///
/// Methods take `&mut self`: the connection is used by exactly one caller at
/// a time and calls never overlap.
#[async_trait]
pub trait ToolProvider: Send {
    /// Discover the available tools, in the order the server lists them.
    async fn list_tools(&mut self) -> Result<Vec<ToolDescriptor>>;

    /// Invoke one tool and return its raw result items.
    async fn call_tool(&mut self, name: &str, arguments: &Map<String, Value>) -> Result<ToolCallResult>;

    /// Release the connection.
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// One capability served by `toolbridge-tools`.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name used in function calls
    fn name(&self) -> &str;

    /// Description of what the tool does
    fn description(&self) -> &str;

    /// JSON Schema for parameters
    fn parameters(&self) -> Value;

    /// Execute the tool with given parameters
    async fn execute(&self, params: Value) -> Result<String>;

    /// Describe the tool for `tools/list`
    fn to_descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_string(),
            description: Some(self.description().to_string()),
            input_schema: Some(self.parameters()),
        }
    }
}

/// Scripted tool provider for testing.
#[cfg(test)]
pub struct ScriptedTools {
    pub descriptors: Vec<ToolDescriptor>,
    results: std::collections::HashMap<String, std::result::Result<ToolCallResult, String>>,
    pub calls: Vec<(String, Map<String, Value>)>,
    pub closed: bool,
}

#[cfg(test)]
impl ScriptedTools {
    pub fn new() -> Self {
        Self {
            descriptors: Vec::new(),
            results: std::collections::HashMap::new(),
            calls: Vec::new(),
            closed: false,
        }
    }

    /// Register a tool that always returns `text`.
    pub fn with_text(mut self, name: &str, text: &str) -> Self {
        self.descriptors.push(ToolDescriptor {
            name: name.to_string(),
            description: Some(format!("{} tool", name)),
            input_schema: None,
        });
        self.results
            .insert(name.to_string(), Ok(ToolCallResult::text(text)));
        self
    }

    /// Register a tool that always fails with `message`.
    pub fn with_failure(mut self, name: &str, message: &str) -> Self {
        self.descriptors.push(ToolDescriptor {
            name: name.to_string(),
            description: None,
            input_schema: None,
        });
        self.results.insert(name.to_string(), Err(message.to_string()));
        self
    }

    pub fn call_names(&self) -> Vec<&str> {
        self.calls.iter().map(|(name, _)| name.as_str()).collect()
    }
}

#[cfg(test)]
#[async_trait]
impl ToolProvider for ScriptedTools {
    async fn list_tools(&mut self) -> Result<Vec<ToolDescriptor>> {
        Ok(self.descriptors.clone())
    }

    async fn call_tool(&mut self, name: &str, arguments: &Map<String, Value>) -> Result<ToolCallResult> {
        self.calls.push((name.to_string(), arguments.clone()));
        match self.results.get(name) {
            Some(Ok(result)) => Ok(result.clone()),
            Some(Err(message)) => Err(crate::error::Error::Tool(message.clone())),
            None => Err(crate::error::Error::Tool(format!("Unknown tool: {}", name))),
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}
