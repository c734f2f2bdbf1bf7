//! MCP client: handshake, discovery and invocation over stdio.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::io::{AsyncBufRead, AsyncWrite, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, info, warn};

use crate::config::{Config, ENV_DEBUG};
use crate::error::Error;
use crate::tools::{ToolCallResult, ToolDescriptor, ToolProvider};
use crate::Result;

use super::transport::LineTransport;

/// Protocol revision announced in `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// How long `close` waits for the server to exit after stdin is closed.
const EXIT_GRACE: Duration = Duration::from_secs(2);

/// Server identity reported by `initialize`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    #[serde(default)]
    pub protocol_version: String,
    #[serde(default)]
    pub server_info: ServerInfo,
    #[serde(default)]
    pub capabilities: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToolsPage {
    #[serde(default)]
    tools: Vec<ToolDescriptor>,
    #[serde(default)]
    next_cursor: Option<String>,
}

/// Client end of a tool-serving connection.
pub struct McpClient<R, W> {
    transport: Option<LineTransport<R, W>>,
    child: Option<Child>,
    call_timeout: Option<Duration>,
}

/// Client talking to a spawned child over its stdin/stdout.
pub type StdioMcpClient = McpClient<BufReader<ChildStdout>, ChildStdin>;

impl StdioMcpClient {
    /// Launch `command_line` through the shell with piped stdio.
    ///
    /// The child's stderr is inherited so its diagnostics reach the terminal.
    /// With `debug` set the child also sees `DEBUG=1`.
    pub fn spawn(command_line: &str, debug: bool) -> Result<Self> {
        info!("Starting tool server: {}", command_line);

        let mut command = Command::new("sh");
        command.arg("-c").arg(format!("exec {}", command_line));
        if debug {
            command.env(ENV_DEBUG, "1");
        }

        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Tool(format!("Failed to start tool server `{}`: {}", command_line, e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Protocol("tool server stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Protocol("tool server stdout unavailable".to_string()))?;

        let mut client = McpClient::new(BufReader::new(stdout), stdin);
        client.child = Some(child);
        Ok(client)
    }

    /// Spawn the configured server and complete the handshake.
    pub async fn connect(config: &Config) -> Result<Self> {
        let command_line = config.resolved_server_cmd()?;
        let mut client = Self::spawn(&command_line, config.debug)?
            .with_call_timeout(config.tool_timeout_secs.map(Duration::from_secs));
        client.initialize().await?;
        Ok(client)
    }
}

impl<R, W> McpClient<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Wrap an already-connected stream pair.
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            transport: Some(LineTransport::new(reader, writer)),
            child: None,
            call_timeout: None,
        }
    }

    /// Bound each `tools/call`; `None` waits indefinitely.
    pub fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    fn transport(&mut self) -> Result<&mut LineTransport<R, W>> {
        self.transport
            .as_mut()
            .ok_or_else(|| Error::Protocol("connection to tool server is closed".to_string()))
    }

    /// Perform the `initialize` handshake.
    pub async fn initialize(&mut self) -> Result<InitializeResult> {
        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            }
        });

        let transport = self.transport()?;
        let result = transport.request("initialize", Some(params)).await?;
        transport.notify("notifications/initialized", None).await?;

        let init: InitializeResult = serde_json::from_value(result)?;
        debug!(
            "tool server initialized: {} {} (protocol {})",
            init.server_info.name, init.server_info.version, init.protocol_version
        );
        Ok(init)
    }
}

#[async_trait]
impl<R, W> ToolProvider for McpClient<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn list_tools(&mut self) -> Result<Vec<ToolDescriptor>> {
        let transport = self.transport()?;
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let params = cursor.as_ref().map(|c| json!({ "cursor": c }));
            let page: ToolsPage = serde_json::from_value(transport.request("tools/list", params).await?)?;
            tools.extend(page.tools);

            match page.next_cursor.filter(|c| !c.is_empty()) {
                Some(next) if cursor.as_deref() != Some(next.as_str()) => cursor = Some(next),
                _ => break,
            }
        }

        debug!("discovered {} tools", tools.len());
        Ok(tools)
    }

    async fn call_tool(&mut self, name: &str, arguments: &Map<String, Value>) -> Result<ToolCallResult> {
        let params = json!({ "name": name, "arguments": arguments });
        let call_timeout = self.call_timeout;
        let transport = self.transport()?;

        let result = match call_timeout {
            Some(limit) => tokio::time::timeout(limit, transport.request("tools/call", Some(params)))
                .await
                .map_err(|_| Error::Timeout(format!("tool {} after {:?}", name, limit)))??,
            None => transport.request("tools/call", Some(params)).await?,
        };

        Ok(ToolCallResult::from_value(result)?)
    }

    /// Close stdin so the server sees EOF, then reap it.
    async fn close(&mut self) -> Result<()> {
        self.transport = None;

        if let Some(mut child) = self.child.take() {
            match tokio::time::timeout(EXIT_GRACE, child.wait()).await {
                Ok(status) => debug!("tool server exited: {:?}", status?),
                Err(_) => {
                    warn!("tool server did not exit after EOF, killing it");
                    child.kill().await?;
                }
            }
        }
        Ok(())
    }
}
