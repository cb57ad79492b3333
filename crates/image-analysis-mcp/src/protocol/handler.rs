//! Main request dispatcher — receives JSON-RPC messages, routes to handlers.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::service::AnalysisService;
use crate::tools::ToolRegistry;
use crate::types::*;

use super::negotiation::NegotiatedCapabilities;
use super::validator::validate_request;

/// Dispatches incoming JSON-RPC messages to protocol and tool handlers.
pub struct ProtocolHandler {
    service: Arc<AnalysisService>,
    capabilities: Mutex<NegotiatedCapabilities>,
}

impl ProtocolHandler {
    pub fn new(service: Arc<AnalysisService>) -> Self {
        Self {
            service,
            capabilities: Mutex::new(NegotiatedCapabilities::default()),
        }
    }

    pub fn service(&self) -> &AnalysisService {
        &self.service
    }

    /// True once the client has sent the `initialized` notification.
    pub async fn is_initialized(&self) -> bool {
        self.capabilities.lock().await.initialized
    }

    /// Handle one message. Returns the response to send, if any.
    pub async fn handle_message(&self, msg: JsonRpcMessage) -> Option<Value> {
        match msg {
            JsonRpcMessage::Request(req) => Some(self.handle_request(req).await),
            JsonRpcMessage::Notification(notif) => {
                self.handle_notification(notif).await;
                None
            }
            _ => {
                tracing::warn!("Received unexpected message type from client");
                None
            }
        }
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> Value {
        if let Err(e) = validate_request(&request) {
            return to_value(&e.to_json_rpc_error(request.id));
        }

        let id = request.id.clone();
        match self.dispatch_request(request).await {
            Ok(value) => to_value(&JsonRpcResponse::new(id, value)),
            Err(e) => {
                tracing::debug!("Request {id} failed: {e}");
                to_value(&e.to_json_rpc_error(id))
            }
        }
    }

    async fn dispatch_request(&self, request: JsonRpcRequest) -> McpResult<Value> {
        match request.method.as_str() {
            "initialize" => self.handle_initialize(request.params).await,
            "shutdown" => {
                tracing::info!("Shutdown requested");
                Ok(empty_object())
            }
            "tools/list" => self.handle_tools_list(),
            "tools/call" => self.handle_tools_call(request.params).await,
            "ping" => Ok(empty_object()),
            _ => Err(McpError::MethodNotFound(request.method)),
        }
    }

    async fn handle_notification(&self, notification: JsonRpcNotification) {
        match notification.method.as_str() {
            "initialized" | "notifications/initialized" => {
                self.capabilities.lock().await.mark_initialized();
            }
            "notifications/cancelled" | "$/cancelRequest" => {
                tracing::info!("Received cancellation notification");
            }
            _ => {
                tracing::debug!("Unknown notification: {}", notification.method);
            }
        }
    }

    async fn handle_initialize(&self, params: Option<Value>) -> McpResult<Value> {
        let init_params: InitializeParams = parse_params(params, "Initialize")?;
        let result = self.capabilities.lock().await.negotiate(init_params);
        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }

    fn handle_tools_list(&self) -> McpResult<Value> {
        let result = ToolListResult {
            tools: ToolRegistry::list_tools(),
            next_cursor: None,
        };
        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }

    async fn handle_tools_call(&self, params: Option<Value>) -> McpResult<Value> {
        let call_params: ToolCallParams = parse_params(params, "Tool call")?;

        let result =
            ToolRegistry::call(&call_params.name, call_params.arguments, &self.service).await?;

        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }
}

fn parse_params<T: DeserializeOwned>(params: Option<Value>, what: &str) -> McpResult<T> {
    params
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| McpError::InvalidParams(e.to_string()))?
        .ok_or_else(|| McpError::InvalidParams(format!("{what} params required")))
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}
