//! Image analysis core — path guarding, image loading, cache keys, persisted
//! result caching, and vision backends.

pub mod backend;
pub mod cache;
pub mod guard;
pub mod keyer;
pub mod loader;
pub mod types;

pub use backend::{AnalysisBackend, OpenAiBackend, OpenAiConfig};
pub use cache::ResultCache;
pub use guard::{is_within_roots, PathGuard, MOUNT_ROOT};
pub use keyer::cache_key;
pub use loader::ImageLoader;
pub use types::*;
