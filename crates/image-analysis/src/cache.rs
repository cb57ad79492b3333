//! Persisted analysis cache, partitioned by input kind.
//!
//! The whole store is held in memory and rewritten to a single JSON file after
//! every successful `store`. Entries never expire.

use std::path::{Path, PathBuf};

use tokio::sync::{Mutex, RwLock};

use crate::types::{AnalysisError, AnalysisResult, CacheEntry, CacheKind, CacheStore};

#[derive(Debug)]
enum CacheState {
    Loading,
    Ready(CacheStore),
}

/// Read-through / write-through cache of analysis results.
#[derive(Debug)]
pub struct ResultCache {
    path: PathBuf,
    state: RwLock<CacheState>,
    // Orders file writes; held across the snapshot and the write so the
    // newest snapshot always lands last.
    write_gate: Mutex<()>,
}

impl ResultCache {
    /// Create a handle in the `Loading` state. Call [`ResultCache::load`] next.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: RwLock::new(CacheState::Loading),
            write_gate: Mutex::new(()),
        }
    }

    /// Create a handle and load it before returning.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let cache = Self::new(path);
        cache.load().await;
        cache
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the backing file. A missing or unreadable file yields an empty store.
    pub async fn load(&self) {
        let mut state = self.state.write().await;
        if let CacheState::Loading = *state {
            *state = CacheState::Ready(read_store(&self.path).await);
        }
    }

    /// True once the backing file has been loaded.
    pub fn is_ready(&self) -> bool {
        matches!(
            self.state.try_read().as_deref(),
            Ok(CacheState::Ready(_))
        )
    }

    /// Look up a cached entry without waiting.
    ///
    /// Misses while the store is still loading, and during the brief in-memory
    /// upsert of a concurrent `store`. File writes do not block lookups.
    pub fn lookup(&self, kind: CacheKind, key: &str) -> Option<CacheEntry> {
        let state = self.state.try_read().ok()?;
        match &*state {
            CacheState::Ready(store) => store.partition(kind).get(key).cloned(),
            CacheState::Loading => None,
        }
    }

    /// Number of entries in one partition (zero while loading).
    pub fn len(&self, kind: CacheKind) -> usize {
        match self.state.try_read().as_deref() {
            Ok(CacheState::Ready(store)) => store.partition(kind).len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len(CacheKind::Url) == 0 && self.len(CacheKind::Path) == 0
    }

    /// Upsert an entry and rewrite the backing file.
    ///
    /// If the write fails the error is returned, but the entry stays cached in
    /// memory for the rest of the process.
    pub async fn store(&self, kind: CacheKind, key: &str, analysis: String) -> AnalysisResult<()> {
        let _gate = self.write_gate.lock().await;

        let snapshot = {
            let mut state = self.state.write().await;
            if let CacheState::Loading = *state {
                *state = CacheState::Ready(read_store(&self.path).await);
            }
            match &mut *state {
                CacheState::Ready(store) => {
                    store
                        .partition_mut(kind)
                        .insert(key.to_string(), CacheEntry::new(analysis));
                    store.clone()
                }
                CacheState::Loading => return Ok(()),
            }
        };

        write_store(&self.path, &snapshot).await
    }
}

async fn read_store(path: &Path) -> CacheStore {
    match tokio::fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice::<CacheStore>(&bytes) {
            Ok(store) => {
                tracing::info!(
                    "Loaded analysis cache {} ({} url, {} path entries)",
                    path.display(),
                    store.by_url_key.len(),
                    store.by_path_key.len()
                );
                store
            }
            Err(e) => {
                tracing::warn!(
                    "Ignoring unreadable cache file {}: {e}",
                    path.display()
                );
                CacheStore::default()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("No cache file at {}, starting empty", path.display());
            CacheStore::default()
        }
        Err(e) => {
            tracing::warn!("Failed to read cache file {}: {e}", path.display());
            CacheStore::default()
        }
    }
}

async fn write_store(path: &Path, store: &CacheStore) -> AnalysisResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let payload = serde_json::to_vec_pretty(store)
        .map_err(|e| AnalysisError::Io(std::io::Error::other(format!("Serialization failed: {e}"))))?;

    tokio::fs::write(path, payload).await?;
    tracing::debug!("Saved analysis cache: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyer::cache_key;

    #[tokio::test]
    async fn test_store_then_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResultCache::open(dir.path().join("cache.json")).await;
        let key = cache_key("https://example.com/cat.jpg");

        assert!(cache.lookup(CacheKind::Url, &key).is_none());
        cache
            .store(CacheKind::Url, &key, "A cat on a sofa.".to_string())
            .await
            .unwrap();

        let entry = cache.lookup(CacheKind::Url, &key).unwrap();
        assert_eq!(entry.analysis, "A cat on a sofa.");
    }

    #[tokio::test]
    async fn test_partitions_never_cross_hit() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResultCache::open(dir.path().join("cache.json")).await;
        let key = cache_key("/home/alice/cat.jpg");

        cache
            .store(CacheKind::Url, &key, "url result".to_string())
            .await
            .unwrap();
        assert!(cache.lookup(CacheKind::Path, &key).is_none());
        assert_eq!(cache.len(CacheKind::Url), 1);
        assert_eq!(cache.len(CacheKind::Path), 0);
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResultCache::open(dir.path().join("cache.json")).await;

        cache.store(CacheKind::Path, "k", "first".to_string()).await.unwrap();
        cache.store(CacheKind::Path, "k", "second".to_string()).await.unwrap();

        assert_eq!(cache.lookup(CacheKind::Path, "k").unwrap().analysis, "second");
        assert_eq!(cache.len(CacheKind::Path), 1);
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cache.json");

        let cache = ResultCache::open(&path).await;
        cache.store(CacheKind::Url, "u", "url".to_string()).await.unwrap();
        cache.store(CacheKind::Path, "p", "path".to_string()).await.unwrap();
        drop(cache);

        let reopened = ResultCache::open(&path).await;
        assert_eq!(reopened.lookup(CacheKind::Url, "u").unwrap().analysis, "url");
        assert_eq!(reopened.lookup(CacheKind::Path, "p").unwrap().analysis, "path");
    }

    #[tokio::test]
    async fn test_lookup_before_load_is_miss() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        ResultCache::open(&path)
            .await
            .store(CacheKind::Url, "k", "cached".to_string())
            .await
            .unwrap();

        let cache = ResultCache::new(&path);
        assert!(!cache.is_ready());
        assert!(cache.lookup(CacheKind::Url, "k").is_none());

        cache.load().await;
        assert!(cache.is_ready());
        assert!(cache.lookup(CacheKind::Url, "k").is_some());
    }

    #[tokio::test]
    async fn test_store_before_load_keeps_existing_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        ResultCache::open(&path)
            .await
            .store(CacheKind::Url, "old", "old".to_string())
            .await
            .unwrap();

        let cache = ResultCache::new(&path);
        cache.store(CacheKind::Url, "new", "new".to_string()).await.unwrap();
        cache.load().await;

        assert!(cache.lookup(CacheKind::Url, "old").is_some());
        assert!(cache.lookup(CacheKind::Url, "new").is_some());
    }

    #[tokio::test]
    async fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, b"{not json").unwrap();

        let cache = ResultCache::open(&path).await;
        assert!(cache.is_ready());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_persist_failure_keeps_memory_entry() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the parent directory should be.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();
        let cache = ResultCache::open(blocker.join("cache.json")).await;

        let result = cache.store(CacheKind::Url, "k", "kept".to_string()).await;
        assert!(matches!(result, Err(AnalysisError::Io(_))));
        assert_eq!(cache.lookup(CacheKind::Url, "k").unwrap().analysis, "kept");
    }

    #[tokio::test]
    async fn test_lookup_hits_while_write_pending() {
        let dir = tempfile::tempdir().unwrap();
        let cache = std::sync::Arc::new(ResultCache::open(dir.path().join("cache.json")).await);
        cache.store(CacheKind::Url, "a", "first".to_string()).await.unwrap();

        // Park a second store behind an in-flight file write.
        let gate = cache.write_gate.lock().await;
        let pending = tokio::spawn({
            let cache = cache.clone();
            async move { cache.store(CacheKind::Url, "b", "second".to_string()).await }
        });
        tokio::task::yield_now().await;

        assert_eq!(cache.lookup(CacheKind::Url, "a").unwrap().analysis, "first");
        assert!(cache.is_ready());

        drop(gate);
        pending.await.unwrap().unwrap();
        assert_eq!(cache.lookup(CacheKind::Url, "b").unwrap().analysis, "second");

        let reopened = ResultCache::open(cache.path()).await;
        assert_eq!(reopened.len(CacheKind::Url), 2);
    }
}
