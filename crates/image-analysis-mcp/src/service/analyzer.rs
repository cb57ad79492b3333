//! Cached analysis flow shared by both tools.

use std::sync::Arc;

use image_analysis::{
    cache_key, AnalysisBackend, AnalysisResult, CacheKind, ImageLoader, ImagePayload,
    ResultCache,
};

/// A validated tool input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Url(String),
    Path(String),
}

impl ImageSource {
    pub fn kind(&self) -> CacheKind {
        match self {
            ImageSource::Url(_) => CacheKind::Url,
            ImageSource::Path(_) => CacheKind::Path,
        }
    }

    /// The caller's original argument string; the cache key derives from it.
    pub fn raw(&self) -> &str {
        match self {
            ImageSource::Url(s) | ImageSource::Path(s) => s,
        }
    }
}

/// Text returned for a successful analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub text: String,
    pub cached: bool,
}

/// Owns the cache, loader, and backend for the lifetime of the server.
pub struct AnalysisService {
    cache: Arc<ResultCache>,
    loader: ImageLoader,
    backend: Arc<dyn AnalysisBackend>,
}

impl AnalysisService {
    pub fn new(
        cache: Arc<ResultCache>,
        loader: ImageLoader,
        backend: Arc<dyn AnalysisBackend>,
    ) -> Self {
        Self {
            cache,
            loader,
            backend,
        }
    }

    /// Serve from cache, or load, analyze, and cache.
    ///
    /// Failures are never cached. A cache write failure is logged and the
    /// fresh analysis is still returned.
    pub async fn analyze(&self, source: &ImageSource) -> AnalysisResult<Analysis> {
        let kind = source.kind();
        let key = cache_key(source.raw());

        if let Some(entry) = self.cache.lookup(kind, &key) {
            tracing::debug!("Cache hit ({kind}) for {}", source.raw());
            return Ok(Analysis {
                text: entry.analysis,
                cached: true,
            });
        }
        tracing::debug!("Cache miss ({kind}) for {}", source.raw());

        let payload = self.load(source).await?;
        let text = self.backend.analyze(&payload).await?;

        if let Err(e) = self.cache.store(kind, &key, text.clone()).await {
            tracing::warn!(
                "Failed to persist analysis cache {}: {e}",
                self.cache.path().display()
            );
        }

        Ok(Analysis {
            text,
            cached: false,
        })
    }

    async fn load(&self, source: &ImageSource) -> AnalysisResult<ImagePayload> {
        match source {
            ImageSource::Url(url) => self.loader.load_from_url(url).await,
            ImageSource::Path(path) => self.loader.load_from_path(path).await,
        }
    }
}
