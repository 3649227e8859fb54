use anyhow::Result;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use crate::error::McpError;
use crate::slack::SessionCredentials;

use super::handlers::RequestHandler;
use super::types::*;

/// Per-connection protocol state.
#[derive(Debug, Default)]
pub struct McpSession {
    initialized: RwLock<bool>,
}

impl McpSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_initialized(&self) -> bool {
        *self.initialized.read().await
    }
}

/// Transport-independent MCP dispatcher.
///
/// Transports own the sessions and decide which credentials a request runs
/// with; the server only routes JSON-RPC methods.
pub struct McpServer {
    handler: Arc<RequestHandler>,
}

impl McpServer {
    pub fn new(handler: RequestHandler) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }

    /// Handle one raw JSON-RPC message. `None` means no reply is due (notification).
    pub async fn process_request(
        &self,
        session: &McpSession,
        credentials: Option<&SessionCredentials>,
        input: &str,
    ) -> Result<Option<JsonRpcResponse>> {
        // Parse JSON-RPC request
        let value: Value = match serde_json::from_str(input) {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to parse request: {}", e);
                return Ok(Some(JsonRpcResponse::error(
                    None,
                    JsonRpcError::parse_error(),
                )));
            }
        };

        let request_id = value.get("id").cloned().filter(|id| !id.is_null());
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(req) => req,
            Err(e) => {
                warn!("Invalid request: {}", e);
                return Ok(Some(JsonRpcResponse::error(
                    request_id,
                    JsonRpcError::invalid_request(),
                )));
            }
        };

        // Validate JSON-RPC version
        if request.jsonrpc != "2.0" {
            return Ok(Some(JsonRpcResponse::error(
                request.id.clone(),
                JsonRpcError::invalid_request(),
            )));
        }

        debug!(method = %request.method, "Handling request");

        let is_notification = request.id.is_none();
        let method = request.method.clone();

        // Route to appropriate handler
        let response = match method.as_str() {
            "initialize" => self.handle_initialize(request).await?,
            "initialized" | "notifications/initialized" => {
                self.handle_initialized(session, request).await
            }
            "ping" => JsonRpcResponse::success(request.id, json!({})),
            "tools/list" => self.handle_list_tools(session, request).await?,
            "tools/call" => self.handle_call_tool(session, credentials, request).await?,
            "prompts/list" => JsonRpcResponse::success(request.id, json!({ "prompts": [] })),
            "resources/list" => JsonRpcResponse::success(request.id, json!({ "resources": [] })),
            _ => {
                if !is_notification {
                    warn!("Unknown method: {}", method);
                }
                JsonRpcResponse::error(request.id, JsonRpcError::method_not_found(&method))
            }
        };

        // Notifications never get a reply, even when handling them failed
        if is_notification {
            debug!(method = %method, "Handled notification");
            return Ok(None);
        }

        Ok(Some(response))
    }

    async fn handle_initialize(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse> {
        let params = match request.params.map(serde_json::from_value::<InitializeRequest>) {
            Some(Ok(p)) => p,
            Some(Err(e)) => {
                return Ok(JsonRpcResponse::error(
                    request.id,
                    JsonRpcError::invalid_params(format!("Invalid initialize params: {}", e)),
                ));
            }
            None => {
                return Ok(JsonRpcResponse::error(
                    request.id,
                    JsonRpcError::invalid_params("Missing params".to_string()),
                ));
            }
        };

        // Support both protocol versions
        let protocol_version = if params.protocol_version.starts_with("2025") {
            PROTOCOL_VERSION_2025.to_string()
        } else {
            PROTOCOL_VERSION.to_string()
        };

        let result = InitializeResult {
            protocol_version,
            capabilities: ServerCapabilities {
                tools: HashMap::new(),
                experimental: Default::default(),
            },
            server_info: ServerInfo {
                name: "slack".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        Ok(JsonRpcResponse::success(
            request.id,
            serde_json::to_value(result)?,
        ))
    }

    async fn handle_initialized(
        &self,
        session: &McpSession,
        request: JsonRpcRequest,
    ) -> JsonRpcResponse {
        *session.initialized.write().await = true;
        JsonRpcResponse::success(request.id, Value::Null)
    }

    async fn handle_list_tools(
        &self,
        session: &McpSession,
        request: JsonRpcRequest,
    ) -> Result<JsonRpcResponse> {
        if !session.is_initialized().await {
            return Ok(not_initialized(request.id));
        }

        let result = ListToolsResult {
            tools: self.handler.list_tools(),
        };

        Ok(JsonRpcResponse::success(
            request.id,
            serde_json::to_value(result)?,
        ))
    }

    async fn handle_call_tool(
        &self,
        session: &McpSession,
        credentials: Option<&SessionCredentials>,
        request: JsonRpcRequest,
    ) -> Result<JsonRpcResponse> {
        if !session.is_initialized().await {
            return Ok(not_initialized(request.id));
        }

        let params = match request.params.map(serde_json::from_value::<CallToolRequest>) {
            Some(Ok(p)) => p,
            Some(Err(e)) => {
                return Ok(JsonRpcResponse::error(
                    request.id,
                    JsonRpcError::invalid_params(format!("Invalid tools/call params: {}", e)),
                ));
            }
            None => {
                return Ok(JsonRpcResponse::error(
                    request.id,
                    JsonRpcError::invalid_params("Missing params".to_string()),
                ));
            }
        };

        let Some(credentials) = credentials else {
            let e = McpError::MissingCredentials(
                "provide X-Slack-Web-Token and X-Slack-Cookie-Token headers".to_string(),
            );
            return Ok(JsonRpcResponse::error(
                request.id,
                JsonRpcError::invalid_params(e.to_string()),
            ));
        };

        match self
            .handler
            .call_tool(&params.name, credentials, params.arguments)
            .await
        {
            Ok(result) => Ok(JsonRpcResponse::success(
                request.id,
                serde_json::to_value(result)?,
            )),
            Err(e) if e.is_client_error() => Ok(JsonRpcResponse::error(
                request.id,
                JsonRpcError::invalid_params(e.to_string()),
            )),
            Err(e) => {
                error!("Tool execution failed: {}", e);
                Ok(JsonRpcResponse::error(
                    request.id,
                    JsonRpcError::internal_error(e.to_string()),
                ))
            }
        }
    }
}

fn not_initialized(id: Option<Value>) -> JsonRpcResponse {
    JsonRpcResponse::error(
        id,
        JsonRpcError::internal_error("Server not initialized".to_string()),
    )
}
