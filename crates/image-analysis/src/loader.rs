//! Turn tool arguments (URL or local path) into analyzable image payloads.

use std::time::Duration;

use base64::Engine;

use crate::guard::PathGuard;
use crate::types::{
    is_image_media_type, AnalysisError, AnalysisResult, ImagePayload, FALLBACK_MEDIA_TYPE,
};

/// Default timeout for the URL probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Loads images from URLs (metadata probe only) and from guarded local paths.
#[derive(Debug, Clone)]
pub struct ImageLoader {
    client: reqwest::Client,
    guard: PathGuard,
}

impl ImageLoader {
    pub fn new(client: reqwest::Client, guard: PathGuard) -> Self {
        Self { client, guard }
    }

    /// Build a loader with its own HTTP client.
    pub fn with_timeout(guard: PathGuard, timeout: Duration) -> AnalysisResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnalysisError::Upstream(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self::new(client, guard))
    }

    /// Probe `url` with a HEAD request and accept it only if it serves an image.
    pub async fn load_from_url(&self, url: &str) -> AnalysisResult<ImagePayload> {
        let resp = self
            .client
            .head(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AnalysisError::Upstream(format!("Cannot access image URL: {e}")))?;

        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        match content_type {
            Some(ct) if is_image_media_type(&ct) => {
                tracing::debug!("URL probe ok: {url} ({ct})");
                Ok(ImagePayload::remote(url))
            }
            other => Err(AnalysisError::InvalidParams(format!(
                "URL is not an image: {}",
                other.as_deref().unwrap_or("no content type")
            ))),
        }
    }

    /// Read a local image through the path guard and embed it as base64.
    pub async fn load_from_path(&self, raw_path: &str) -> AnalysisResult<ImagePayload> {
        let path = self.guard.resolve(raw_path)?;

        if !tokio::fs::try_exists(&path).await? {
            return Err(AnalysisError::InvalidParams(format!(
                "File not found: {}",
                path.display()
            )));
        }

        let bytes = tokio::fs::read(&path).await?;
        let data = base64::engine::general_purpose::STANDARD.encode(&bytes);

        let media_type = mime_guess::from_path(&path)
            .first_raw()
            .unwrap_or(FALLBACK_MEDIA_TYPE);

        if !is_image_media_type(media_type) {
            return Err(AnalysisError::InvalidParams(format!(
                "File is not an image: {} ({media_type})",
                path.display()
            )));
        }

        tracing::debug!(
            "Loaded {} ({media_type}, {} bytes)",
            path.display(),
            bytes.len()
        );
        ImagePayload::embedded(data, media_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn loader_for(root: &std::path::Path) -> ImageLoader {
        let guard = PathGuard::new(root.to_path_buf(), vec![root.to_path_buf()]);
        ImageLoader::with_timeout(guard, Duration::from_secs(5)).unwrap()
    }

    fn outside_loader() -> ImageLoader {
        let guard = PathGuard::new(PathBuf::from("/nowhere"), vec![PathBuf::from("/nowhere")]);
        ImageLoader::with_timeout(guard, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_url_image_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/cat.jpg"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-type", "image/jpeg"))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/cat.jpg", server.uri());
        let payload = outside_loader().load_from_url(&url).await.unwrap();
        assert_eq!(payload, ImagePayload::Remote { url });
    }

    #[tokio::test]
    async fn test_url_html_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(
                ResponseTemplate::new(200).insert_header("content-type", "text/html; charset=utf-8"),
            )
            .mount(&server)
            .await;

        let err = outside_loader()
            .load_from_url(&format!("{}/page", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidParams(ref m) if m.contains("not an image")));
    }

    #[tokio::test]
    async fn test_url_missing_content_type_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let err = outside_loader()
            .load_from_url(&format!("{}/blob", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidParams(_)));
    }

    #[tokio::test]
    async fn test_url_probe_failure_is_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(404).insert_header("content-type", "image/png"))
            .mount(&server)
            .await;

        let err = outside_loader()
            .load_from_url(&format!("{}/gone.png", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Upstream(ref m) if m.contains("Cannot access")));

        let err = outside_loader().load_from_url("not a url").await.unwrap_err();
        assert!(matches!(err, AnalysisError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_path_embeds_base64() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("dot.png");
        std::fs::write(&file, [0x89, b'P', b'N', b'G']).unwrap();

        let payload = loader_for(dir.path())
            .load_from_path(file.to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(
            payload,
            ImagePayload::Embedded {
                data: "iVBORw==".to_string(),
                media_type: "image/png".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_path_relative_to_cwd() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("photo.JPG"), b"jpeg").unwrap();

        let payload = loader_for(dir.path()).load_from_path("photo.JPG").await.unwrap();
        assert!(matches!(payload, ImagePayload::Embedded { ref media_type, .. } if media_type == "image/jpeg"));
    }

    #[tokio::test]
    async fn test_path_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.png");
        let err = loader_for(dir.path())
            .load_from_path(missing.to_str().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidParams(ref m) if m.starts_with("File not found")));
    }

    #[tokio::test]
    async fn test_path_stat_failure_is_io() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("blocker"), b"not a dir").unwrap();
        let nested = dir.path().join("blocker").join("cat.png");

        let err = loader_for(dir.path())
            .load_from_path(nested.to_str().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Io(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_path_non_image_extension() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["notes.txt", "binary"] {
            let file = dir.path().join(name);
            std::fs::write(&file, b"hello").unwrap();
            let err = loader_for(dir.path())
                .load_from_path(file.to_str().unwrap())
                .await
                .unwrap_err();
            assert!(matches!(err, AnalysisError::InvalidParams(ref m) if m.contains("not an image")));
        }
    }

    #[tokio::test]
    async fn test_path_outside_roots_rejected_even_if_exists() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("cat.png");
        std::fs::write(&file, b"png").unwrap();

        let err = outside_loader()
            .load_from_path(file.to_str().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidParams(ref m) if m.starts_with("Access denied")));
    }
}
