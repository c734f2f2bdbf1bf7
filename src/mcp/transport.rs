//! Line-framed JSON-RPC client over any async byte stream pair.
//!
//! Requests are strictly sequential: one request is written, then lines are
//! read until the matching response arrives. Lines that are not for us
//! (notifications, stray output, stale responses) are logged and skipped.

use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::error::Error;
use crate::Result;

use super::jsonrpc::{Incoming, Notification, Request, Response, JSONRPC_VERSION, METHOD_NOT_FOUND};

pub struct LineTransport<R, W> {
    reader: R,
    writer: W,
    next_id: u64,
}

impl<R, W> LineTransport<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            next_id: 1,
        }
    }

    async fn write_message<T: Serialize>(&mut self, message: &T) -> Result<()> {
        let mut line = serde_json::to_string(message)?;
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Send a notification.
    pub async fn notify(&mut self, method: &str, params: Option<Value>) -> Result<()> {
        self.write_message(&Notification {
            jsonrpc: JSONRPC_VERSION,
            method,
            params,
        })
        .await
    }

    /// Send a request and wait for its result.
    pub async fn request(&mut self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = self.next_id;
        self.next_id += 1;

        self.write_message(&Request {
            jsonrpc: JSONRPC_VERSION,
            id,
            method,
            params,
        })
        .await?;

        let expected = json!(id);
        let mut line = String::new();
        loop {
            line.clear();
            if self.reader.read_line(&mut line).await? == 0 {
                return Err(Error::Protocol(format!(
                    "tool server closed the connection while waiting for {}",
                    method
                )));
            }

            let text = line.trim();
            if text.is_empty() {
                continue;
            }

            match Incoming::parse(text) {
                Ok(Incoming::Response(response)) if response.id == expected => {
                    return response.into_result(method);
                }
                Ok(Incoming::Response(response)) => {
                    warn!("Received response for unknown request ID: {}", response.id);
                }
                Ok(Incoming::Notification { method, .. }) => {
                    debug!("Received notification: method={}", method);
                }
                Ok(Incoming::Request { id, method, .. }) => {
                    self.answer_server_request(id, &method).await?;
                }
                Err(e) => {
                    debug!("Skipping unparseable line from tool server ({}): {}", e, text);
                }
            }
        }
    }

    async fn answer_server_request(&mut self, id: Value, method: &str) -> Result<()> {
        let response = if method == "ping" {
            Response::success(id, json!({}))
        } else {
            warn!("Received unexpected request from tool server: {}", method);
            Response::failure(id, METHOD_NOT_FOUND, format!("Method not found: {}", method))
        };
        self.write_message(&response).await
    }
}
