mod common;

use serde_json::{json, Map, Value};
use toolbridge::mcp::{StdioMcpClient, SERVER_NAME};
use toolbridge::tools::ToolProvider;
use toolbridge::Error;

fn args(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

async fn connect() -> StdioMcpClient {
    let mut client = StdioMcpClient::spawn(&common::tool_server_cmd(), false).unwrap();
    let init = client.initialize().await.unwrap();
    assert_eq!(init.server_info.name, SERVER_NAME);
    client
}

#[tokio::test]
async fn test_discovers_bundled_tools() {
    let mut client = connect().await;

    let tools = client.list_tools().await.unwrap();
    let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["get_time", "read_text", "list_dir"]);
    assert!(tools.iter().all(|t| t.input_schema.is_some()));

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_calls_tools_in_child_process() {
    let tmp = tempfile::TempDir::new().unwrap();
    std::fs::write(tmp.path().join("notes.txt"), "line one\nline two").unwrap();
    std::fs::create_dir(tmp.path().join("sub")).unwrap();

    let mut client = connect().await;

    let time = client.call_tool("get_time", &Map::new()).await.unwrap();
    assert!(!time.is_error);
    assert!(chrono::DateTime::parse_from_rfc3339(&time.to_text()).is_ok());

    let path = tmp.path().join("notes.txt");
    let read = client
        .call_tool("read_text", &args(json!({ "path": path.to_str().unwrap() })))
        .await
        .unwrap();
    assert_eq!(read.to_text(), "line one\nline two");

    let listing = client
        .call_tool("list_dir", &args(json!({ "path": tmp.path().to_str().unwrap() })))
        .await
        .unwrap();
    assert_eq!(listing.to_text(), "notes.txt\nsub/");

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_failed_call_is_flagged() {
    let mut client = connect().await;

    let result = client
        .call_tool("read_text", &args(json!({ "path": "/definitely/not/here.txt" })))
        .await
        .unwrap();
    assert!(result.is_error);
    assert!(result.to_text().contains("File does not exist"));

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_close_reaps_child_and_blocks_further_calls() {
    let mut client = connect().await;
    client.close().await.unwrap();
    client.close().await.unwrap();

    assert!(matches!(client.list_tools().await, Err(Error::Protocol(_))));
}

#[tokio::test]
async fn test_bad_command_fails_handshake() {
    let mut client = StdioMcpClient::spawn("true", false).unwrap();
    assert!(client.initialize().await.is_err());
}
