//! Configuration loading and resolution.

use std::path::PathBuf;
use std::time::Duration;

use image_analysis::backend::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_PROMPT};
use image_analysis::loader::DEFAULT_PROBE_TIMEOUT;
use image_analysis::OpenAiConfig;

use crate::types::{McpError, McpResult};

/// Directory under `$HOME` holding the cache file.
pub const CACHE_DIR_NAME: &str = ".image-analysis-mcp";
pub const CACHE_FILE_NAME: &str = "analysis-cache.json";

/// Resolve the cache file path: explicit flag, then `IMAGE_ANALYSIS_CACHE`,
/// then `$HOME/.image-analysis-mcp/analysis-cache.json`.
pub fn resolve_cache_path(explicit: Option<&str>) -> PathBuf {
    if let Some(path) = explicit {
        return PathBuf::from(path);
    }

    if let Ok(env_path) = std::env::var("IMAGE_ANALYSIS_CACHE") {
        if !env_path.is_empty() {
            return PathBuf::from(env_path);
        }
    }

    default_cache_path()
}

fn default_cache_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CACHE_DIR_NAME)
        .join(CACHE_FILE_NAME)
}

/// HTTP timeout for the URL probe, from `IMAGE_ANALYSIS_TIMEOUT_SECS`.
pub fn probe_timeout() -> Duration {
    std::env::var("IMAGE_ANALYSIS_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|s| *s > 0)
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_PROBE_TIMEOUT)
}

/// Backend settings from the environment. `OPENAI_API_KEY` is required.
pub fn openai_config(model_override: Option<&str>) -> McpResult<OpenAiConfig> {
    let api_key = std::env::var("OPENAI_API_KEY")
        .ok()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| {
            McpError::Config("OPENAI_API_KEY environment variable is required".to_string())
        })?;

    let mut config = OpenAiConfig::new(api_key);
    config.base_url = env_or("OPENAI_BASE_URL", DEFAULT_BASE_URL);
    config.model = model_override
        .map(str::to_string)
        .unwrap_or_else(|| env_or("OPENAI_MODEL", DEFAULT_MODEL));
    config.prompt = env_or("IMAGE_ANALYSIS_PROMPT", DEFAULT_PROMPT);
    Ok(config)
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}
