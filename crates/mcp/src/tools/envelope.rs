// Uniform success / failure envelopes for tool results

use crate::protocol::{CallToolResult, ToolContent};
use abraflexi_core::ToolError;
use serde_json::{json, Map, Value};

/// Tool-specific part of a success envelope.
pub type Payload = Map<String, Value>;

/// `{"success": true, ...payload}` as pretty-printed JSON text.
pub fn success(payload: Payload) -> CallToolResult {
    let mut body = Map::with_capacity(payload.len() + 1);
    body.insert("success".to_string(), Value::Bool(true));
    body.extend(payload);

    CallToolResult {
        content: vec![ToolContent::text(render(&Value::Object(body)))],
        is_error: None,
    }
}

/// `{"success": false, "error": kind, "message": text}`, flagged with `isError`.
pub fn failure(err: &ToolError) -> CallToolResult {
    let body = json!({
        "success": false,
        "error": err.kind(),
        "message": err.to_string(),
    });

    CallToolResult {
        content: vec![ToolContent::text(render(&body))],
        is_error: Some(true),
    }
}

fn render(body: &Value) -> String {
    serde_json::to_string_pretty(body).unwrap_or_else(|_| body.to_string())
}
