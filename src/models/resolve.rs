//! Identifier classification and dispatch
//!
//! A model identifier is either a direct download URL, fetched into the
//! external cache, or a repository name handed to a [`ModelLoader`].

use std::fmt;
use std::path::PathBuf;

use super::download::download_url_model;
use super::loader::{ModelLoader, load_named_model};
use crate::config::ResolverConfig;
use crate::error::ResolveResult;
use crate::proxy::http_proxy;

/// Local reference written back into a task argument slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedModel {
    /// External cache directory holding `model.safetensors`
    Cached(PathBuf),
    /// Repository name, cached by the loader under the hub cache dir
    Named(String),
}

impl ResolvedModel {
    pub fn into_reference(self) -> String {
        match self {
            Self::Cached(dir) => dir.to_string_lossy().into_owned(),
            Self::Named(name) => name,
        }
    }
}

impl fmt::Display for ResolvedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cached(dir) => write!(f, "{}", dir.display()),
            Self::Named(name) => write!(f, "{}", name),
        }
    }
}

/// True if `identifier` is an absolute URL with a non-empty host
pub fn is_url(identifier: &str) -> bool {
    reqwest::Url::parse(identifier)
        .map(|url| url.host_str().is_some_and(|host| !host.is_empty()))
        .unwrap_or(false)
}

/// Resolve one identifier to a local reference
///
/// URLs go to the external cache; anything else is a name for `loader`.
pub async fn resolve_model<L>(
    identifier: &str,
    loader: &L,
    config: &ResolverConfig,
) -> ResolveResult<ResolvedModel>
where
    L: ModelLoader + ?Sized,
{
    if is_url(identifier) {
        let proxy = http_proxy(config.proxy.as_ref());
        download_url_model(identifier, &config.external_cache_dir, proxy.as_ref())
            .await
            .map(ResolvedModel::Cached)
    } else {
        load_named_model(
            identifier,
            loader,
            &config.hf_cache_dir,
            config.proxy.as_ref(),
        )
        .await
        .map(ResolvedModel::Named)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_classified() {
        assert!(is_url("https://example.com/model.bin"));
        assert!(is_url("http://127.0.0.1:8080/model.safetensors"));
        assert!(is_url(
            "https://civitai.com/api/download/models/128713?type=Model&format=SafeTensor"
        ));
    }

    #[test]
    fn test_names_classified() {
        assert!(!is_url("my-org/my-model"));
        assert!(!is_url("runwayml/stable-diffusion-v1-5"));
        assert!(!is_url("stabilityai/sd-vae-ft-mse"));
        assert!(!is_url(""));
        assert!(!is_url("example.com/model.bin"));
    }

    #[test]
    fn test_hostless_schemes_are_names() {
        assert!(!is_url("C:\\models\\model.safetensors"));
        assert!(!is_url("mailto:someone@example.com"));
        assert!(!is_url("file:///models/model.safetensors"));
    }

    #[test]
    fn test_resolved_reference() {
        let cached = ResolvedModel::Cached(PathBuf::from("/cache/abc"));
        assert_eq!(cached.to_string(), "/cache/abc");
        assert_eq!(cached.into_reference(), "/cache/abc");

        let named = ResolvedModel::Named("org/model".to_string());
        assert_eq!(named.to_string(), "org/model");
        assert_eq!(named.into_reference(), "org/model");
    }
}
