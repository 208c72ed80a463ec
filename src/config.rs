//! Configuration structures and loading logic

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::cache::get_cache_dir;

/// Storage and network policy for a resolution pass
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ResolverConfig {
    /// Cache root handed to named-model loaders
    pub hf_cache_dir: PathBuf,
    /// Root of the `<sha256>/model.safetensors` store for URL models
    pub external_cache_dir: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyConfig>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            hf_cache_dir: get_cache_dir(),
            external_cache_dir: default_external_cache_dir(),
            proxy: None,
        }
    }
}

impl ResolverConfig {
    /// Load configuration from file with environment variable overrides
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let mut config = if let Some(path) = path {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content).context("Failed to parse TOML config")?
        } else {
            Self::default()
        };

        if let Ok(dir) = std::env::var("SD_MODEL_CACHE_HF_DIR") {
            config.hf_cache_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("SD_MODEL_CACHE_EXTERNAL_DIR") {
            config.external_cache_dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.hf_cache_dir.as_os_str().is_empty() {
            anyhow::bail!("hf_cache_dir cannot be empty");
        }
        if self.external_cache_dir.as_os_str().is_empty() {
            anyhow::bail!("external_cache_dir cannot be empty");
        }

        if let Some(proxy) = &self.proxy
            && proxy.is_enabled()
            && proxy.port == 0
        {
            anyhow::bail!("Proxy '{}' requires a non-zero port", proxy.host);
        }

        Ok(())
    }
}

/// Proxy policy. An empty `host` means no proxy.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl ProxyConfig {
    pub fn is_enabled(&self) -> bool {
        !self.host.is_empty()
    }
}

fn default_external_cache_dir() -> PathBuf {
    let hub = get_cache_dir();
    match hub.parent() {
        Some(root) => root.join("external"),
        None => PathBuf::from("/tmp/huggingface/external"),
    }
}
