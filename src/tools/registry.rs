//! Conversion of discovered tools into chat function schemas.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use super::ToolDescriptor;

/// Function-calling schema entry sent to the chat endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionSchema,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSchema {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl From<&ToolDescriptor> for ToolSchema {
    fn from(tool: &ToolDescriptor) -> Self {
        Self {
            kind: "function".to_string(),
            function: FunctionSchema {
                name: tool.name.clone(),
                description: tool.description.clone().unwrap_or_default(),
                parameters: tool
                    .input_schema
                    .clone()
                    .filter(|schema| !schema.is_null())
                    .unwrap_or_else(empty_object_schema),
            },
        }
    }
}

fn empty_object_schema() -> Value {
    json!({"type": "object", "properties": {}})
}

/// One schema per descriptor, in discovery order.
pub fn build_tools_schema(tools: &[ToolDescriptor]) -> Vec<ToolSchema> {
    let schema: Vec<ToolSchema> = tools.iter().map(ToolSchema::from).collect();
    debug!("built tools schema count={}", schema.len());
    schema
}
