//! Tool call extraction from raw chat responses.
//!
//! Two shapes are accepted, in priority order:
//! 1. structured `message.tool_calls[].function.{name, arguments}` entries
//! 2. a bare JSON object in the text content: `{"tool": NAME, "args": {...}}`
//!
//! Nothing in here fails. Undecodable arguments become an empty mapping and
//! undecodable content means "no tool call".

use serde_json::{Map, Value};
use tracing::debug;

use super::llm::{ChatResponse, WireToolCall};
use super::message::ToolCallRequest;

/// Extract the ordered tool calls a response asks for.
///
/// An empty result means the turn is finished.
pub fn extract_tool_calls(response: &ChatResponse) -> Vec<ToolCallRequest> {
    let mut calls: Vec<ToolCallRequest> = response
        .message
        .tool_calls
        .iter()
        .flatten()
        .filter_map(structured_call)
        .collect();

    if calls.is_empty() {
        if let Some(call) = response.message.content.as_deref().and_then(fallback_call) {
            calls.push(call);
        }
    }

    debug!("extracted tool_calls: {:?}", calls);
    calls
}

fn structured_call(entry: &WireToolCall) -> Option<ToolCallRequest> {
    let function = entry.function.as_ref()?;
    let name = function.name.as_deref().filter(|n| !n.is_empty())?;
    Some(ToolCallRequest::new(name, decode_arguments(&function.arguments)))
}

/// Arguments arrive as JSON-encoded text from OpenAI-style endpoints and as
/// an inline object from Ollama. Anything else is an empty mapping.
fn decode_arguments(raw: &Value) -> Map<String, Value> {
    match raw {
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                debug!("undecodable tool arguments {:?}, using empty mapping", text);
                Map::new()
            }
        },
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    }
}

fn fallback_call(content: &str) -> Option<ToolCallRequest> {
    let Ok(Value::Object(object)) = serde_json::from_str::<Value>(content.trim()) else {
        return None;
    };

    let name = match object.get("tool")? {
        Value::String(name) => name.clone(),
        other => other.to_string(),
    };
    let arguments = match object.get("args") {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    };

    Some(ToolCallRequest::new(name, arguments))
}
