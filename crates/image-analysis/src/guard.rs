//! Allow-list check for caller-supplied file paths.
//!
//! A coarse traversal guard: absolute paths must sit under the working
//! directory, the user's home directory, or the mount root. Relative paths are
//! anchored to the working directory and let through. Symlinks are not
//! followed, so this is not a sandbox.

use std::path::{Component, Path, PathBuf};

use crate::types::{AnalysisError, AnalysisResult};

/// Mount-root prefix that is always readable (e.g. Windows drives under WSL).
pub const MOUNT_ROOT: &str = "/mnt";

/// Resolves tool-supplied paths against a fixed set of allowed roots.
#[derive(Debug, Clone)]
pub struct PathGuard {
    cwd: PathBuf,
    roots: Vec<PathBuf>,
}

impl PathGuard {
    /// Create a guard with an explicit working directory and allow-list.
    pub fn new(cwd: PathBuf, roots: Vec<PathBuf>) -> Self {
        Self { cwd, roots }
    }

    /// Allow-list of the current directory, `$HOME`, and [`MOUNT_ROOT`].
    pub fn from_env() -> AnalysisResult<Self> {
        let cwd = std::env::current_dir()?;
        let mut roots = vec![cwd.clone()];
        if let Some(home) = dirs::home_dir() {
            roots.push(home);
        }
        roots.push(PathBuf::from(MOUNT_ROOT));
        Ok(Self::new(cwd, roots))
    }

    /// Resolve `raw_path` to a normalized absolute path, or reject it.
    ///
    /// Existence is not checked here.
    pub fn resolve(&self, raw_path: &str) -> AnalysisResult<PathBuf> {
        let path = Path::new(raw_path);

        if !path.is_absolute() {
            return Ok(normalize(&self.cwd.join(path)));
        }

        let resolved = normalize(path);
        if !is_within_roots(&resolved, &self.roots) {
            tracing::warn!("Rejected path outside allowed roots: {raw_path}");
            return Err(AnalysisError::InvalidParams(format!(
                "Access denied: {raw_path} is outside the allowed directories"
            )));
        }

        Ok(resolved)
    }
}

/// True if `path` equals or lies beneath one of `roots`.
///
/// Separators are normalized to `/` before comparing, and matching happens on
/// component boundaries.
pub fn is_within_roots(path: &Path, roots: &[PathBuf]) -> bool {
    let candidate = separators_to_slash(&path.to_string_lossy());
    roots.iter().any(|root| {
        let root = separators_to_slash(&root.to_string_lossy());
        let root = root.trim_end_matches('/');
        if root.is_empty() {
            // filesystem root
            return candidate.starts_with('/');
        }
        candidate == root
            || candidate
                .strip_prefix(root)
                .is_some_and(|rest| rest.starts_with('/'))
    })
}

fn separators_to_slash(s: &str) -> String {
    s.replace('\\', "/")
}

/// Collapse `.` and `..` components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
