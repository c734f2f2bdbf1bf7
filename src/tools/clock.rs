//! Clock tool - current local time

use async_trait::async_trait;
use chrono::Local;
use serde_json::{json, Value};
use crate::Result;
use super::Tool;

/// Return the current local time as an ISO-8601 string
pub struct GetTimeTool;

#[async_trait]
impl Tool for GetTimeTool {
    fn name(&self) -> &str { "get_time" }
    fn description(&self) -> &str { "Return the current local time as an ISO-8601 string" }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _params: Value) -> Result<String> {
        Ok(Local::now().to_rfc3339())
    }
}
