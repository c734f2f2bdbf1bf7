//! Tool runner - registry of served tools

use serde_json::Value;
use crate::Result;
use crate::error::Error;
use super::{GetTimeTool, ListDirTool, ReadTextTool, Tool, ToolDescriptor};

/// Tool runner keeps tools in registration order and executes them by name
pub struct ToolRunner {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRunner {
    /// Create an empty tool runner
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Create a tool runner with the bundled tools
    pub fn new_with_defaults() -> Self {
        let mut runner = Self::new();
        runner.register(GetTimeTool);
        runner.register(ReadTextTool);
        runner.register(ListDirTool);
        runner
    }

    /// Register a tool, replacing any tool with the same name in place
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        match self.tools.iter().position(|t| t.name() == tool.name()) {
            Some(index) => self.tools[index] = Box::new(tool),
            None => self.tools.push(Box::new(tool)),
        }
    }

    /// Descriptors for `tools/list`, in registration order
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(|t| t.to_descriptor()).collect()
    }

    /// Execute a tool by name
    pub async fn execute(&self, name: &str, params: Value) -> Result<String> {
        let tool = self
            .tools
            .iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| Error::Tool(format!("Unknown tool: {}", name)))?;

        tool.execute(params).await
    }

    /// List registered tool names
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }
}

impl Default for ToolRunner {
    fn default() -> Self {
        Self::new()
    }
}
