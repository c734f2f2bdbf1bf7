//! Tool invocation against a live provider.

use tracing::debug;

use crate::agent::preview;
use crate::agent::ToolCallRequest;
use crate::error::Error;
use crate::Result;

use super::ToolProvider;

/// Run one tool call and flatten its result to text.
///
/// Tool-side failures (an `isError` result, unknown tool, transport errors)
/// are returned as errors. An empty result is the empty string.
pub async fn invoke<P>(provider: &mut P, call: &ToolCallRequest) -> Result<String>
where
    P: ToolProvider + ?Sized,
{
    debug!("call tool: name={}, args={:?}", call.name, call.arguments);

    let result = provider.call_tool(&call.name, &call.arguments).await?;
    let text = result.to_text();

    if result.is_error {
        return Err(Error::Tool(format!("{} failed: {}", call.name, text)));
    }

    debug!("tool result len={} preview='{}'", text.len(), preview(&text));
    Ok(text)
}
