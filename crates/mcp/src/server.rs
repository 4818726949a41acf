// MCP server: JSON-RPC dispatch and the stdio transport

use crate::protocol::{
    negotiate_version, CallToolParams, InitializeParams, InitializeResult, JsonRpcError,
    JsonRpcRequest, JsonRpcResponse, ListToolsResult, ServerCapabilities, ServerInfo,
    ToolsCapability,
};
use crate::tools::ToolRegistry;
use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

pub const SERVER_NAME: &str = "abraflexi-mcp-server";

/// Serves the tool registry over JSON-RPC.
///
/// Cheap to clone; the HTTP transport shares one instance across requests.
#[derive(Clone)]
pub struct McpServer {
    registry: Arc<ToolRegistry>,
}

impl McpServer {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Handle one raw JSON-RPC message. `None` means nothing should be sent back.
    pub async fn handle_message(&self, raw: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                warn!("Discarding malformed JSON-RPC message: {}", e);
                return Some(JsonRpcResponse::error(Value::Null, JsonRpcError::parse_error()));
            }
        };

        match serde_json::from_value::<JsonRpcRequest>(value.clone()) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => {
                debug!("Invalid JSON-RPC request: {}", e);
                let id = value.get("id").cloned().unwrap_or(Value::Null);
                Some(JsonRpcResponse::error(id, JsonRpcError::invalid_request()))
            }
        }
    }

    /// Dispatch a parsed request. Notifications never get a response.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id.clone() else {
            debug!(method = %request.method, "Notification received");
            return None;
        };
        debug!(method = %request.method, "Request received");

        let response = match request.method.as_str() {
            "initialize" => self.initialize(id, request.params),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => JsonRpcResponse::success(
                id,
                ListToolsResult {
                    tools: self.registry.list_schemas(),
                },
            ),
            "tools/call" => self.call_tool(id, request.params).await,
            method => JsonRpcResponse::error(id, JsonRpcError::method_not_found(method)),
        };
        Some(response)
    }

    fn initialize(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let params: InitializeParams = match params {
            Some(params) => match serde_json::from_value(params) {
                Ok(params) => params,
                Err(e) => {
                    return JsonRpcResponse::error(
                        id,
                        JsonRpcError::invalid_params(format!("Invalid initialize params: {}", e)),
                    )
                }
            },
            None => InitializeParams::default(),
        };

        let version = negotiate_version(params.protocol_version.as_deref());
        match &params.client_info {
            Some(client) => info!(client = %client.name, client_version = %client.version, protocol = version, "Client initialized"),
            None => info!(protocol = version, "Client initialized"),
        }

        let mode = if self.registry.gate().is_read_only() {
            "read-only: create, update and delete tools are disabled"
        } else {
            "read-write"
        };

        JsonRpcResponse::success(
            id,
            InitializeResult {
                protocol_version: version.to_string(),
                capabilities: ServerCapabilities {
                    tools: Some(ToolsCapability {
                        list_changed: false,
                    }),
                },
                server_info: ServerInfo {
                    name: SERVER_NAME.to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                },
                instructions: Some(format!(
                    "Tools for the AbraFlexi ERP REST API. The server is {}.",
                    mode
                )),
            },
        )
    }

    async fn call_tool(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let Some(params) = params else {
            return JsonRpcResponse::error(id, JsonRpcError::invalid_params("Missing params"));
        };
        let params: CallToolParams = match serde_json::from_value(params) {
            Ok(params) => params,
            Err(e) => {
                return JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_params(format!("Invalid tools/call params: {}", e)),
                )
            }
        };

        match self.registry.call(&params.name, params.arguments).await {
            Some(result) => JsonRpcResponse::success(id, result),
            None => JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_params(format!("Unknown tool: {}", params.name)),
            ),
        }
    }

    /// Serve newline-delimited JSON-RPC over stdin/stdout until stdin closes.
    pub async fn serve_stdio(&self) -> Result<()> {
        info!(tools = self.registry.len(), "Serving MCP over stdio");
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await
    }

    /// Serve newline-delimited JSON-RPC over any reader/writer pair.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .await
                .context("Failed to read request")?;
            if read == 0 {
                break;
            }

            let response = match std::str::from_utf8(&buf) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    self.handle_message(line).await
                }
                Err(e) => {
                    warn!("Request is not valid UTF-8: {}", e);
                    Some(JsonRpcResponse::error(Value::Null, JsonRpcError::parse_error()))
                }
            };

            if let Some(response) = response {
                let mut encoded =
                    serde_json::to_string(&response).context("Failed to encode response")?;
                encoded.push('\n');
                writer
                    .write_all(encoded.as_bytes())
                    .await
                    .context("Failed to write response")?;
                writer.flush().await.context("Failed to flush response")?;
            }
        }

        info!("Input closed, MCP server stopping");
        Ok(())
    }
}
