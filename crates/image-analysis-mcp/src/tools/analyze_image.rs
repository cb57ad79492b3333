//! Tool: analyze_image — Analyze an image by URL.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::service::{AnalysisService, ImageSource};
use crate::types::{McpError, McpResult, ToolDefinition};

pub const NAME: &str = "analyze_image";

#[derive(Debug, Deserialize)]
struct AnalyzeImageParams {
    #[serde(rename = "imageUrl")]
    image_url: String,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: NAME.to_string(),
        description: Some(
            "Analyze the content of an image at a URL with a vision model".to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {
                "imageUrl": { "type": "string", "description": "URL of the image to analyze" }
            },
            "required": ["imageUrl"]
        }),
    }
}

/// Validate the argument shape before any I/O.
pub fn parse(args: Value) -> McpResult<ImageSource> {
    let params: AnalyzeImageParams = serde_json::from_value(args).map_err(|_| {
        McpError::InvalidParams("imageUrl is required and must be a string".to_string())
    })?;
    Ok(ImageSource::Url(params.image_url))
}

pub async fn execute(args: Value, service: &AnalysisService) -> McpResult<String> {
    let source = parse(args)?;
    Ok(service.analyze(&source).await?.text)
}
