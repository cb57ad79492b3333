//! Error types and JSON-RPC error codes for the MCP server.

use image_analysis::AnalysisError;

use super::message::{JsonRpcError, RequestId};

/// Standard JSON-RPC 2.0 error codes.
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// All errors that can occur in the MCP server.
#[derive(thiserror::Error, Debug)]
pub enum McpError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Unknown JSON-RPC method or unknown tool name.
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    /// URL probe or inference backend failure.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Missing or invalid startup configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl McpError {
    pub fn code(&self) -> i32 {
        use error_codes::*;
        match self {
            McpError::ParseError(_) | McpError::Json(_) => PARSE_ERROR,
            McpError::InvalidRequest(_) => INVALID_REQUEST,
            McpError::MethodNotFound(_) => METHOD_NOT_FOUND,
            McpError::InvalidParams(_) => INVALID_PARAMS,
            McpError::InternalError(_)
            | McpError::Upstream(_)
            | McpError::Config(_)
            | McpError::Io(_) => INTERNAL_ERROR,
        }
    }

    pub fn to_json_rpc_error(&self, id: RequestId) -> JsonRpcError {
        JsonRpcError::new(id, self.code(), self.to_string())
    }
}

impl From<AnalysisError> for McpError {
    fn from(e: AnalysisError) -> Self {
        match e {
            AnalysisError::InvalidParams(m) => McpError::InvalidParams(m),
            AnalysisError::Io(e) => McpError::Io(e),
            AnalysisError::Upstream(m) => McpError::Upstream(m),
        }
    }
}

pub type McpResult<T> = Result<T, McpError>;
