//! Vision inference backends.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::types::{AnalysisError, AnalysisResult, ImagePayload};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4-turbo";
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Default instruction sent with every image. Override it through
/// [`OpenAiConfig::prompt`] to ask for a different focus or answer language.
pub const DEFAULT_PROMPT: &str = "Analyze the following image and describe its contents in detail.";

const SYSTEM_PROMPT: &str = "Analyze the content of the image in detail and describe it. \
     Answer in the language of the user's instruction.";

/// Anything that can turn an image into descriptive text.
#[async_trait::async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Human-readable backend name for logs.
    fn name(&self) -> &str;

    /// Produce an analysis of `payload`.
    async fn analyze(&self, payload: &ImagePayload) -> AnalysisResult<String>;
}

/// Settings for [`OpenAiBackend`].
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub prompt: String,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(120),
            prompt: DEFAULT_PROMPT.to_string(),
        }
    }
}

/// Backend for any OpenAI-compatible `chat/completions` endpoint with image input.
pub struct OpenAiBackend {
    client: reqwest::Client,
    config: OpenAiConfig,
}

// -- OpenAI-compatible request/response types ---

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<serde_json::Value>,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl OpenAiBackend {
    pub fn new(config: OpenAiConfig) -> AnalysisResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AnalysisError::Upstream(format!("Failed to create HTTP client: {e}")))?;

        tracing::info!(
            "OpenAI backend initialized (model {}, base url {})",
            config.model,
            config.base_url
        );

        Ok(Self { client, config })
    }

    fn request_body(&self, payload: &ImagePayload) -> ChatRequest<'_> {
        ChatRequest {
            model: &self.config.model,
            messages: vec![
                json!({ "role": "system", "content": SYSTEM_PROMPT }),
                json!({
                    "role": "user",
                    "content": [
                        { "type": "text", "text": self.config.prompt },
                        { "type": "image_url", "image_url": { "url": payload.image_url() } }
                    ]
                }),
            ],
            max_tokens: self.config.max_tokens,
        }
    }
}

#[async_trait::async_trait]
impl AnalysisBackend for OpenAiBackend {
    fn name(&self) -> &str {
        "OpenAI"
    }

    async fn analyze(&self, payload: &ImagePayload) -> AnalysisResult<String> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        tracing::info!("Requesting analysis from {} ({})", self.name(), self.config.model);

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&self.request_body(payload))
            .send()
            .await
            .map_err(|e| AnalysisError::Upstream(format!("OpenAI request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let error_text = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&error_text)
                .ok()
                .and_then(|r| r.error)
                .map(|e| e.message)
                .unwrap_or(error_text);
            tracing::warn!("OpenAI API error ({status}): {message}");
            return Err(AnalysisError::Upstream(format!(
                "OpenAI API error ({status}): {message}"
            )));
        }

        let chat: ChatResponse = resp
            .json()
            .await
            .map_err(|e| AnalysisError::Upstream(format!("Failed to parse OpenAI response: {e}")))?;

        let text = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(AnalysisError::Upstream(
                "OpenAI returned an empty analysis".to_string(),
            ));
        }

        Ok(text)
    }
}
