//! Tool registration and dispatch.

use serde_json::Value;

use crate::service::AnalysisService;
use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

use super::{analyze_image, analyze_image_from_path};

pub struct ToolRegistry;

impl ToolRegistry {
    pub fn list_tools() -> Vec<ToolDefinition> {
        vec![
            analyze_image::definition(),
            analyze_image_from_path::definition(),
        ]
    }

    /// Route a call to its tool and return the analysis text or a typed error.
    pub async fn dispatch(
        name: &str,
        arguments: Option<Value>,
        service: &AnalysisService,
    ) -> McpResult<String> {
        let args = arguments.unwrap_or(Value::Object(serde_json::Map::new()));

        match name {
            analyze_image::NAME => analyze_image::execute(args, service).await,
            analyze_image_from_path::NAME => analyze_image_from_path::execute(args, service).await,
            _ => Err(McpError::MethodNotFound(format!("Unknown tool: {name}"))),
        }
    }

    /// Like [`ToolRegistry::dispatch`], but tool failures become error-flagged
    /// results. Only an unknown tool name is returned as an `Err`.
    pub async fn call(
        name: &str,
        arguments: Option<Value>,
        service: &AnalysisService,
    ) -> McpResult<ToolCallResult> {
        match Self::dispatch(name, arguments, service).await {
            Ok(text) => Ok(ToolCallResult::text(text)),
            Err(e @ McpError::MethodNotFound(_)) => Err(e),
            Err(e) => {
                tracing::error!("Tool {name} failed: {e}");
                Ok(ToolCallResult::error(e.to_string()))
            }
        }
    }
}
