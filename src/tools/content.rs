//! Tool result content and its flattening to text.

use serde::Deserialize;
use serde_json::{json, Value};

/// One item of a tool result.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultContent {
    /// `{"type": "text", "text": ...}`
    Text(String),
    /// Any other item that carries a `text` field, directly or inside an
    /// embedded resource.
    Structured { kind: String, text: String },
    /// Everything else (images, audio, links); rendered as its JSON form.
    Opaque(Value),
}

impl ResultContent {
    pub fn from_value(value: Value) -> Self {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        if kind == "text" {
            if let Some(text) = value.get("text").and_then(Value::as_str) {
                return Self::Text(text.to_string());
            }
        }

        let text = value
            .get("text")
            .or_else(|| value.get("resource").and_then(|r| r.get("text")));
        match text {
            Some(Value::String(text)) => Self::Structured {
                kind,
                text: text.clone(),
            },
            Some(Value::Null) => Self::Structured {
                kind,
                text: String::new(),
            },
            Some(other) => Self::Structured {
                kind,
                text: other.to_string(),
            },
            None => Self::Opaque(value),
        }
    }

    /// Text form of this item.
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Structured { text, .. } => text.clone(),
            Self::Opaque(value) => match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
        }
    }
}

/// Result of one `tools/call`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ToolCallResult {
    pub content: Vec<ResultContent>,
    pub is_error: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCallResult {
    #[serde(default)]
    content: Vec<Value>,
    #[serde(default)]
    structured_content: Option<Value>,
    #[serde(default)]
    is_error: bool,
}

impl ToolCallResult {
    /// A successful single-text result.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ResultContent::Text(text.into())],
            is_error: false,
        }
    }

    /// Parse the `result` member of a `tools/call` response.
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        let raw: RawCallResult = serde_json::from_value(value)?;

        let mut content: Vec<ResultContent> =
            raw.content.into_iter().map(ResultContent::from_value).collect();
        if content.is_empty() {
            if let Some(structured) = raw.structured_content.filter(|v| !v.is_null()) {
                content.push(ResultContent::Opaque(structured));
            }
        }

        Ok(Self {
            content,
            is_error: raw.is_error,
        })
    }

    /// Wire form, as written by the tool server.
    pub fn to_value(&self) -> Value {
        let content: Vec<Value> = self
            .content
            .iter()
            .map(|item| match item {
                ResultContent::Opaque(value) => value.clone(),
                other => json!({"type": "text", "text": other.as_text()}),
            })
            .collect();
        json!({"content": content, "isError": self.is_error})
    }

    /// Normalized text of the whole result.
    pub fn to_text(&self) -> String {
        content_to_text(&self.content)
    }
}

/// Join item texts with newlines, in server order, trimmed.
pub fn content_to_text(items: &[ResultContent]) -> String {
    items
        .iter()
        .map(ResultContent::as_text)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
