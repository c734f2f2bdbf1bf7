//! Shared fixtures: a scripted HTTP chat endpoint and the bundled tool server.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Command line that starts the `toolbridge-tools` binary built with the tests.
pub fn tool_server_cmd() -> String {
    format!("\"{}\"", env!("CARGO_BIN_EXE_toolbridge-tools"))
}

/// Minimal HTTP endpoint answering each request with the next scripted reply.
///
/// Once the script runs out every request gets a 503.
pub struct FakeChat {
    pub url: String,
    requests: Arc<Mutex<Vec<Value>>>,
}

impl FakeChat {
    pub async fn start(replies: Vec<(u16, String)>) -> Self {
        Self::start_with_delay(replies, Duration::ZERO).await
    }

    pub async fn start_with_delay(replies: Vec<(u16, String)>, delay: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let replies = Arc::new(Mutex::new(VecDeque::from(replies)));

        let recorded = requests.clone();
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let recorded = recorded.clone();
                let replies = replies.clone();
                tokio::spawn(async move {
                    let _ = handle(stream, recorded, replies, delay).await;
                });
            }
        });

        Self { url, requests }
    }

    /// Request bodies received so far, in arrival order.
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }
}

async fn handle(
    mut stream: TcpStream,
    recorded: Arc<Mutex<Vec<Value>>>,
    replies: Arc<Mutex<VecDeque<(u16, String)>>>,
    delay: Duration,
) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = headers
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let body: Value = serde_json::from_slice(&buf[header_end..]).unwrap_or(Value::Null);
    recorded.lock().unwrap().push(body);

    let (status, reply) = replies
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or((503, r#"{"error":"no scripted reply"}"#.to_string()));

    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let response = format!(
        "HTTP/1.1 {} Scripted\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reply.len(),
        reply
    );
    stream.write_all(response.as_bytes()).await?;
    stream.flush().await?;
    Ok(())
}

/// A final text reply in the endpoint's response shape.
pub fn text_reply(content: &str) -> (u16, String) {
    let body = serde_json::json!({
        "model": "test",
        "message": { "role": "assistant", "content": content },
        "done": true,
        "done_reason": "stop"
    });
    (200, body.to_string())
}

/// A reply requesting one structured tool call.
pub fn tool_call_reply(name: &str, arguments: Value) -> (u16, String) {
    let body = serde_json::json!({
        "model": "test",
        "message": {
            "role": "assistant",
            "content": "",
            "tool_calls": [{ "function": { "name": name, "arguments": arguments } }]
        },
        "done": true,
        "done_reason": "stop"
    });
    (200, body.to_string())
}

/// User input that ends after `text`'s lines.
pub fn input_lines(text: &str) -> toolbridge::session::InputLines {
    let (tx, rx) = tokio::sync::mpsc::channel(text.lines().count().max(1));
    for line in text.lines() {
        tx.try_send(Ok(line.to_string())).unwrap();
    }
    rx
}
