//! Tool: analyze_image_from_path — Analyze a local image file.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::service::{AnalysisService, ImageSource};
use crate::types::{McpError, McpResult, ToolDefinition};

pub const NAME: &str = "analyze_image_from_path";

#[derive(Debug, Deserialize)]
struct AnalyzePathParams {
    #[serde(rename = "imagePath")]
    image_path: String,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: NAME.to_string(),
        description: Some(
            "Analyze a local image file with a vision model. Absolute paths must be under \
             the working directory, the home directory, or /mnt."
                .to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {
                "imagePath": {
                    "type": "string",
                    "description": "Path to the image file (absolute, or relative to the server's working directory)"
                }
            },
            "required": ["imagePath"]
        }),
    }
}

/// Validate the argument shape before any I/O.
pub fn parse(args: Value) -> McpResult<ImageSource> {
    let params: AnalyzePathParams = serde_json::from_value(args).map_err(|_| {
        McpError::InvalidParams("imagePath is required and must be a string".to_string())
    })?;
    Ok(ImageSource::Path(params.image_path))
}

pub async fn execute(args: Value, service: &AnalysisService) -> McpResult<String> {
    let source = parse(args)?;
    Ok(service.analyze(&source).await?.text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let source = parse(json!({ "imagePath": "pics/cat.png" })).unwrap();
        assert_eq!(source, ImageSource::Path("pics/cat.png".to_string()));
    }

    #[test]
    fn test_parse_rejects_bad_shapes() {
        for args in [json!({}), json!({ "imagePath": ["a"] }), json!({ "imageUrl": "x" })] {
            let err = parse(args).unwrap_err();
            assert!(matches!(err, McpError::InvalidParams(ref m) if m.contains("imagePath")));
        }
    }
}
