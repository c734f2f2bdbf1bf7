//! Filesystem tools - read text files and list directories

use std::path::Path;

use async_trait::async_trait;
use serde_json::{json, Value};
use crate::Result;
use crate::error::Error;
use super::Tool;

fn path_param(params: &Value) -> Result<&str> {
    params
        .get("path")
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::Tool("Missing 'path' parameter".to_string()))
}

/// Read a UTF-8 text file
pub struct ReadTextTool;

#[async_trait]
impl Tool for ReadTextTool {
    fn name(&self) -> &str { "read_text" }
    fn description(&self) -> &str { "Read a text file at the given path and return its contents" }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Text file to read"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, params: Value) -> Result<String> {
        let path = path_param(&params)?;

        if !Path::new(path).exists() {
            return Err(Error::Tool(format!("File does not exist: {}", path)));
        }

        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::Tool(format!("Failed to read {}: {}", path, e)))
    }
}

/// Sorted directory listing
pub struct ListDirTool;

#[async_trait]
impl Tool for ListDirTool {
    fn name(&self) -> &str { "list_dir" }
    fn description(&self) -> &str { "List the entries of a directory; subdirectories end with '/'" }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Directory whose entries to list"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, params: Value) -> Result<String> {
        let path = path_param(&params)?;

        let mut dir = tokio::fs::read_dir(path)
            .await
            .map_err(|e| Error::Tool(format!("Cannot list {}: {}", path, e)))?;

        let mut entries = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let mut name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type().await.is_ok_and(|kind| kind.is_dir()) {
                name.push('/');
            }
            entries.push(name);
        }
        entries.sort();

        Ok(entries.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_read_text() {
        let tmp = TempDir::new().unwrap();
        let file_path = tmp.path().join("test.txt");
        std::fs::write(&file_path, "Hello, World!").unwrap();

        let result = ReadTextTool.execute(json!({
            "path": file_path.to_str().unwrap()
        })).await.unwrap();
        assert_eq!(result, "Hello, World!");
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("missing.txt");

        let err = ReadTextTool.execute(json!({
            "path": missing.to_str().unwrap()
        })).await.unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[tokio::test]
    async fn test_missing_path_param() {
        assert!(ReadTextTool.execute(json!({})).await.is_err());
        assert!(ListDirTool.execute(json!({"path": 3})).await.is_err());
    }

    #[tokio::test]
    async fn test_list_dir_sorted() {
        let tmp = TempDir::new().unwrap();
        for file in ["zeta.md", "alpha.txt"] {
            std::fs::write(tmp.path().join(file), "x").unwrap();
        }
        std::fs::create_dir(tmp.path().join("docs")).unwrap();

        let result = ListDirTool.execute(json!({
            "path": tmp.path().to_str().unwrap()
        })).await.unwrap();

        assert_eq!(result, "alpha.txt\ndocs/\nzeta.md");
    }
}
