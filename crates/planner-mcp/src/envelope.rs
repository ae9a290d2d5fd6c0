use rmcp::model::{CallToolResult, Content};
use serde_json::{json, Value};

use crate::dispatch::{ToolError, ToolOutput};

/// Wrap a tool outcome. Failures become `{success: false, error}` flagged as errors.
pub fn respond(tool: &str, outcome: Result<ToolOutput, ToolError>) -> CallToolResult {
    match outcome {
        Ok(ToolOutput::Json(payload)) => json_result(&payload),
        Ok(ToolOutput::Markdown(text)) => CallToolResult::success(vec![Content::text(text)]),
        Err(e) => {
            tracing::error!(tool, error = %e, "tool call failed");
            json_result(&json!({ "success": false, "error": e.to_string() }))
        }
    }
}

/// Pretty-printed JSON text; `success: false` marks the result as an error.
pub fn json_result(payload: &Value) -> CallToolResult {
    let failed = payload.get("success").and_then(Value::as_bool) == Some(false);
    let text = serde_json::to_string_pretty(payload)
        .unwrap_or_else(|e| format!("{{\"success\": false, \"error\": \"{e}\"}}"));
    let content = vec![Content::text(text)];
    if failed {
        CallToolResult::error(content)
    } else {
        CallToolResult::success(content)
    }
}
