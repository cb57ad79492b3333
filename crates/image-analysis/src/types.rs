//! Core data types for image payloads, cache entries, and errors.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default media type when a file extension is not recognized.
pub const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// Returns true if the media type names an image (`image/*`).
pub fn is_image_media_type(media_type: &str) -> bool {
    media_type.starts_with("image/")
}

/// An image ready to be handed to an analysis backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImagePayload {
    /// The backend fetches the image itself.
    Remote { url: String },
    /// Base64-encoded file contents.
    Embedded { data: String, media_type: String },
}

impl ImagePayload {
    pub fn remote(url: impl Into<String>) -> Self {
        ImagePayload::Remote { url: url.into() }
    }

    /// Build an embedded payload. Fails unless `media_type` is `image/*`.
    pub fn embedded(data: String, media_type: &str) -> AnalysisResult<Self> {
        if !is_image_media_type(media_type) {
            return Err(AnalysisError::InvalidParams(format!(
                "Media type is not an image: {media_type}"
            )));
        }
        Ok(ImagePayload::Embedded {
            data,
            media_type: media_type.to_string(),
        })
    }

    /// URL form accepted by vision APIs: the remote URL, or a `data:` URL.
    pub fn image_url(&self) -> String {
        match self {
            ImagePayload::Remote { url } => url.clone(),
            ImagePayload::Embedded { data, media_type } => {
                format!("data:{media_type};base64,{data}")
            }
        }
    }
}

/// Which cache partition an input belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    Url,
    Path,
}

impl std::fmt::Display for CacheKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKind::Url => write!(f, "url"),
            CacheKind::Path => write!(f, "path"),
        }
    }
}

/// A cached analysis. Replaced wholesale on a later write for the same key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub analysis: String,
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(analysis: String) -> Self {
        Self {
            analysis,
            created_at: Utc::now(),
        }
    }
}

/// Both cache partitions, as persisted on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStore {
    #[serde(default)]
    pub by_url_key: HashMap<String, CacheEntry>,
    #[serde(default)]
    pub by_path_key: HashMap<String, CacheEntry>,
}

impl CacheStore {
    pub fn partition(&self, kind: CacheKind) -> &HashMap<String, CacheEntry> {
        match kind {
            CacheKind::Url => &self.by_url_key,
            CacheKind::Path => &self.by_path_key,
        }
    }

    pub fn partition_mut(&mut self, kind: CacheKind) -> &mut HashMap<String, CacheEntry> {
        match kind {
            CacheKind::Url => &mut self.by_url_key,
            CacheKind::Path => &mut self.by_path_key,
        }
    }
}

/// Errors that can occur while preparing or analyzing an image.
#[derive(thiserror::Error, Debug)]
pub enum AnalysisError {
    /// Bad input: malformed arguments, unsafe path, missing file, non-image content.
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// URL probe or inference backend failure.
    #[error("Upstream error: {0}")]
    Upstream(String),
}

/// Convenience result type.
pub type AnalysisResult<T> = Result<T, AnalysisError>;
