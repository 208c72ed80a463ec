//! Named model loading
//!
//! Name-addressed models are materialized by an external, repository-aware
//! loader. This module defines the loader seam and the fixed options the
//! resolver passes through it.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::config::ProxyConfig;
use crate::error::{LoaderError, ResolveError, ResolveResult};
use crate::metrics;
use crate::proxy::{HubProxy, hub_proxy};

/// Numeric precision requested from a loader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    Half,
    Full,
}

/// Options passed to [`ModelLoader::load`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    pub proxy: Option<HubProxy>,
    pub cache_dir: PathBuf,
    pub precision: Precision,
    pub resume_download: bool,
}

impl LoadOptions {
    /// Options used for every named resolution: half precision, resumable
    pub fn for_cache(cache_dir: &Path, proxy: Option<&ProxyConfig>) -> Self {
        Self {
            proxy: hub_proxy(proxy),
            cache_dir: cache_dir.to_path_buf(),
            precision: Precision::Half,
            resume_download: true,
        }
    }
}

/// Repository-aware loader for one model family
///
/// Implementations download into `options.cache_dir` and own its layout and
/// any partial-state handling.
#[async_trait]
pub trait ModelLoader: Send + Sync {
    type Model: Send;

    async fn load(&self, identifier: &str, options: &LoadOptions)
    -> Result<Self::Model, LoaderError>;
}

#[async_trait]
impl<L: ModelLoader + ?Sized> ModelLoader for std::sync::Arc<L> {
    type Model = L::Model;

    async fn load(
        &self,
        identifier: &str,
        options: &LoadOptions,
    ) -> Result<Self::Model, LoaderError> {
        (**self).load(identifier, options).await
    }
}

/// Materialize a named model through `loader`
///
/// # Returns
/// * `Ok(String)` - The identifier, unchanged; the loaded model is dropped
/// * `Err(ResolveError::Loader)` - The loader's error, untouched
pub async fn load_named_model<L>(
    name: &str,
    loader: &L,
    hf_cache_dir: &Path,
    proxy: Option<&ProxyConfig>,
) -> ResolveResult<String>
where
    L: ModelLoader + ?Sized,
{
    tracing::info!(model_id = %name, cache_dir = ?hf_cache_dir, "Checking named model cache");

    let options = LoadOptions::for_cache(hf_cache_dir, proxy);
    loader
        .load(name, &options)
        .await
        .map_err(ResolveError::Loader)?;

    metrics::record_named_load();
    tracing::debug!(model_id = %name, "Named model ready");

    Ok(name.to_string())
}
