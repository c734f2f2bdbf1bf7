//! JSON-RPC 2.0 message types, one message per line.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;
use crate::Result;

pub const JSONRPC_VERSION: &str = "2.0";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;

/// Outgoing request.
#[derive(Debug, Serialize)]
pub struct Request<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// Outgoing notification (no id, no response).
#[derive(Debug, Serialize)]
pub struct Notification<'a> {
    pub jsonrpc: &'static str,
    pub method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl Response {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    /// The result value, or a protocol error naming `method`.
    pub fn into_result(self, method: &str) -> Result<Value> {
        match self.error {
            Some(err) => Err(Error::Protocol(format!(
                "{} failed: {} (code {})",
                method, err.message, err.code
            ))),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

/// A decoded incoming line.
#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    Request {
        id: Value,
        method: String,
        params: Option<Value>,
    },
    Notification {
        method: String,
        params: Option<Value>,
    },
    Response(Response),
}

impl Incoming {
    pub fn parse(line: &str) -> Result<Self> {
        let mut value: Value = serde_json::from_str(line)?;
        let Some(object) = value.as_object_mut() else {
            return Err(Error::Protocol(format!("expected a JSON object, got {}", line)));
        };

        let method = match object.remove("method") {
            Some(Value::String(method)) => Some(method),
            Some(other) => {
                return Err(Error::Protocol(format!("method must be a string, got {}", other)));
            }
            None => None,
        };

        match method {
            Some(method) => {
                let params = object.remove("params");
                match object.remove("id") {
                    Some(id) if !id.is_null() => Ok(Self::Request { id, method, params }),
                    _ => Ok(Self::Notification { method, params }),
                }
            }
            None => Ok(Self::Response(serde_json::from_value(value)?)),
        }
    }
}
