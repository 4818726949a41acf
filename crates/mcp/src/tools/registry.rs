// Tool trait, registry and schema helpers

use super::envelope::{self, Payload};
use crate::protocol::{CallToolResult, ToolSchema};
use abraflexi_core::{AccessGate, ToolAccess, ToolError};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Tool executor trait
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool schema for MCP
    fn schema(&self) -> ToolSchema;

    /// Execute the tool; the payload becomes the body of the success envelope
    async fn execute(&self, arguments: Value) -> Result<Payload, ToolError>;

    /// Whether the tool mutates remote records (checked against the access gate)
    fn access(&self) -> ToolAccess {
        ToolAccess::Read
    }
}

/// Tool registry: lookup by name, access gate, uniform result envelopes
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
    gate: AccessGate,
}

impl ToolRegistry {
    pub fn new(gate: AccessGate) -> Self {
        Self {
            tools: BTreeMap::new(),
            gate,
        }
    }

    /// Register a tool
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let schema = tool.schema();
        self.tools.insert(schema.name, tool);
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// List all tool schemas, sorted by name
    pub fn list_schemas(&self) -> Vec<ToolSchema> {
        self.tools.values().map(|t| t.schema()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn gate(&self) -> AccessGate {
        self.gate
    }

    /// Run a tool and wrap the outcome in an envelope.
    ///
    /// Write tools are checked against the gate before their arguments are
    /// even parsed. Returns `None` for an unknown tool name.
    pub async fn call(&self, name: &str, arguments: Value) -> Option<CallToolResult> {
        let tool = self.get(name)?;
        let started = Instant::now();

        let outcome = match self.gate.check(tool.access()) {
            Ok(()) => tool.execute(arguments).await,
            Err(e) => Err(e),
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        Some(match outcome {
            Ok(payload) => {
                debug!(tool = name, elapsed_ms, "Tool call succeeded");
                envelope::success(payload)
            }
            Err(err) => {
                warn!(tool = name, kind = ?err.kind(), elapsed_ms, "Tool call failed: {}", err);
                envelope::failure(&err)
            }
        })
    }
}

// Helper functions for creating tool schemas

pub fn json_schema_object(properties: Value, required: Vec<&str>) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

pub fn json_schema_string(description: &str) -> Value {
    json!({
        "type": "string",
        "description": description
    })
}

pub fn json_schema_integer(description: &str) -> Value {
    json!({
        "type": "integer",
        "minimum": 0,
        "description": description
    })
}

pub fn json_schema_number(description: &str) -> Value {
    json!({
        "type": "number",
        "description": description
    })
}

pub fn json_schema_array(items: Value, description: &str) -> Value {
    json!({
        "type": "array",
        "items": items,
        "description": description
    })
}

/// Free-form field map (`data`, `extra_fields`)
pub fn json_schema_fields(description: &str) -> Value {
    json!({
        "type": "object",
        "additionalProperties": true,
        "description": description
    })
}

/// A record id: accepted both as a JSON number and as a numeric string
pub fn json_schema_id(description: &str) -> Value {
    json!({
        "type": ["string", "integer"],
        "description": description
    })
}
