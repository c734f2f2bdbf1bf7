//! MCP server: serves a [`ToolRunner`] over a line-framed stream pair.
//!
//! Only protocol bytes are written to `writer`. Diagnostics go through
//! `tracing`, which the `toolbridge-tools` binary routes to stderr.

use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::tools::{ResultContent, ToolCallResult, ToolRunner};
use crate::Result;

use super::client::PROTOCOL_VERSION;
use super::jsonrpc::{Incoming, Response, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR};

pub const SERVER_NAME: &str = "toolbridge-tools";

#[derive(Debug, Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Option<Map<String, Value>>,
}

/// Tool server bound to one runner.
pub struct ToolServer {
    runner: ToolRunner,
}

impl ToolServer {
    pub fn new(runner: ToolRunner) -> Self {
        Self { runner }
    }

    /// Serve requests until `reader` reaches EOF.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("{} serving {} tools", SERVER_NAME, self.runner.tool_names().len());

        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if let Some(response) = self.handle_line(&line).await {
                let mut out = serde_json::to_string(&response)?;
                out.push('\n');
                writer.write_all(out.as_bytes()).await?;
                writer.flush().await?;
            }
        }

        info!("stdin closed, shutting down");
        Ok(())
    }

    /// Handle one incoming line; `None` when no reply is due.
    pub async fn handle_line(&self, line: &str) -> Option<Response> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        match Incoming::parse(line) {
            Ok(Incoming::Request { id, method, params }) => {
                Some(self.handle_request(id, &method, params).await)
            }
            Ok(Incoming::Notification { method, .. }) => {
                debug!("notification: {}", method);
                None
            }
            Ok(Incoming::Response(response)) => {
                debug!("ignoring response id={}", response.id);
                None
            }
            Err(crate::error::Error::Json(e)) => {
                warn!("unparseable request: {}", e);
                Some(Response::failure(Value::Null, PARSE_ERROR, e.to_string()))
            }
            Err(e) => Some(Response::failure(Value::Null, INVALID_REQUEST, e.to_string())),
        }
    }

    async fn handle_request(&self, id: Value, method: &str, params: Option<Value>) -> Response {
        match method {
            "initialize" => {
                let requested = params
                    .as_ref()
                    .and_then(|p| p.get("protocolVersion"))
                    .and_then(Value::as_str)
                    .unwrap_or(PROTOCOL_VERSION);
                Response::success(
                    id,
                    json!({
                        "protocolVersion": requested,
                        "capabilities": {"tools": {"listChanged": false}},
                        "serverInfo": {"name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION")}
                    }),
                )
            }
            "ping" => Response::success(id, json!({})),
            "tools/list" => Response::success(id, json!({ "tools": self.runner.descriptors() })),
            "tools/call" => {
                let call: CallParams = match params.map(serde_json::from_value::<CallParams>).transpose() {
                    Ok(Some(call)) => call,
                    Ok(None) => return Response::failure(id, INVALID_PARAMS, "missing params"),
                    Err(e) => return Response::failure(id, INVALID_PARAMS, e.to_string()),
                };
                Response::success(id, self.call_tool(call).await.to_value())
            }
            other => Response::failure(id, METHOD_NOT_FOUND, format!("Method not found: {}", other)),
        }
    }

    async fn call_tool(&self, call: CallParams) -> ToolCallResult {
        let arguments = Value::Object(call.arguments.unwrap_or_default());
        debug!("tool={} called args={}", call.name, arguments);

        match self.runner.execute(&call.name, arguments).await {
            Ok(text) => {
                debug!("tool={} ok, bytes={}", call.name, text.len());
                ToolCallResult::text(text)
            }
            Err(e) => {
                debug!("tool={} error: {}", call.name, e);
                ToolCallResult {
                    content: vec![ResultContent::Text(e.to_string())],
                    is_error: true,
                }
            }
        }
    }
}
