//! Cache layout for URL-addressed and name-addressed models
//!
//! URL models live in a flat, content-addressed store keyed by the SHA-256
//! of the identifier:
//! ```text
//! <external_cache_dir>/
//! ├── 3f1c…9a2e/
//! │   └── model.safetensors
//! └── b07d…41c8/
//!     └── model.safetensors
//! ```
//! Named models are stored under `<hf_cache_dir>` in whatever layout the
//! loader uses.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::error::{ResolveError, ResolveResult};

/// Fixed artifact file name inside a URL model's cache directory
pub const MODEL_FILE_NAME: &str = "model.safetensors";

#[cfg(unix)]
const CACHE_DIR_MODE: u32 = 0o755;

/// Get the HuggingFace cache directory
///
/// Checks in order:
/// 1. `$HF_HOME/hub`
/// 2. `$XDG_CACHE_HOME/huggingface/hub`
/// 3. `~/.cache/huggingface/hub`
pub fn get_cache_dir() -> PathBuf {
    if let Ok(hf_home) = std::env::var("HF_HOME") {
        return PathBuf::from(hf_home).join("hub");
    }

    if let Ok(xdg_cache) = std::env::var("XDG_CACHE_HOME") {
        return PathBuf::from(xdg_cache).join("huggingface/hub");
    }

    dirs::home_dir()
        .map(|h| h.join(".cache/huggingface/hub"))
        .unwrap_or_else(|| PathBuf::from("/tmp/huggingface/hub"))
}

/// Location of a URL model inside the external cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePaths {
    pub dir: PathBuf,
    pub file: PathBuf,
}

/// Hex-encoded SHA-256 of the identifier's UTF-8 bytes
pub fn identifier_digest(identifier: &str) -> String {
    format!("{:x}", Sha256::digest(identifier.as_bytes()))
}

/// Compute the cache location for a URL identifier without touching disk
pub fn cache_paths(identifier: &str, external_cache_root: &Path) -> CachePaths {
    let dir = external_cache_root.join(identifier_digest(identifier));
    let file = dir.join(MODEL_FILE_NAME);
    CachePaths { dir, file }
}

/// Compute the cache location and create its directory if missing
///
/// An existing directory is left as is, so a retry after a failed download
/// reuses it.
pub async fn prepare_cache_dir(
    identifier: &str,
    external_cache_root: &Path,
) -> ResolveResult<CachePaths> {
    let paths = cache_paths(identifier, external_cache_root);

    if !tokio::fs::try_exists(&paths.dir).await.unwrap_or(false) {
        tracing::debug!(path = ?paths.dir, "Creating cache directory");

        let mut builder = tokio::fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(CACHE_DIR_MODE);

        builder
            .create(&paths.dir)
            .await
            .map_err(|source| ResolveError::CacheDir {
                path: paths.dir.clone(),
                source,
            })?;
    }

    Ok(paths)
}

/// A cache hit is the artifact existing as a regular file; contents are not verified
pub async fn is_cache_hit(paths: &CachePaths) -> bool {
    tokio::fs::metadata(&paths.file)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}
