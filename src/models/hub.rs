//! HuggingFace Hub loader
//!
//! A [`ModelLoader`] backed by the native Rust hf-hub crate. Files are stored
//! in the standard HuggingFace cache structure under the configured cache
//! directory:
//! ```text
//! <hf_cache_dir>/
//! └── models--runwayml--stable-diffusion-v1-5/
//!     ├── snapshots/
//!     │   └── {revision}/
//!     │       ├── model_index.json
//!     │       └── unet/diffusion_pytorch_model.fp16.safetensors
//!     └── refs/
//!         └── main
//! ```

use async_trait::async_trait;
use hf_hub::api::tokio::{ApiBuilder, ApiError};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::loader::{LoadOptions, ModelLoader, Precision};
use crate::config::ProxyConfig;
use crate::error::LoaderError;
use crate::proxy::hub_proxy;

/// Which files a repository must provide for a model family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFamily {
    /// Full pipelines and components (base model, VAE, ControlNet)
    Pipeline,
    Lora,
    TextualInversion,
}

impl ModelFamily {
    fn includes_configs(self) -> bool {
        matches!(self, Self::Pipeline)
    }
}

#[derive(Debug, Error)]
pub enum HubLoaderError {
    #[error("Failed to create HF API client: {0}")]
    Client(#[source] ApiError),

    #[error("Failed to fetch repository info for {model_id}: {source}")]
    Info {
        model_id: String,
        #[source]
        source: ApiError,
    },

    #[error("Failed to download {file} from {model_id}: {source}")]
    File {
        model_id: String,
        file: String,
        #[source]
        source: ApiError,
    },

    #[error("No weight files found in {0}")]
    NoWeights(String),
}

/// Loader that downloads a model family's files from the HuggingFace Hub
#[derive(Debug, Clone)]
pub struct HubLoader {
    family: ModelFamily,
}

impl HubLoader {
    pub fn new(family: ModelFamily) -> Self {
        Self { family }
    }

    pub fn family(&self) -> ModelFamily {
        self.family
    }
}

#[async_trait]
impl ModelLoader for HubLoader {
    /// Snapshot directory of the downloaded revision
    type Model = PathBuf;

    async fn load(&self, identifier: &str, options: &LoadOptions) -> Result<PathBuf, LoaderError> {
        Ok(download_snapshot(identifier, self.family, options).await?)
    }
}

/// Endpoint of a configured hub proxy that [`HubLoader`] downloads bypass.
///
/// hf-hub builds its own HTTP client without a proxy hook, so
/// `LoadOptions::proxy` is not routed through; only `HTTPS_PROXY` and
/// `HTTP_PROXY` from the process environment reach it. Callers surface this
/// once at startup.
pub fn unapplied_proxy(proxy: Option<&ProxyConfig>) -> Option<String> {
    hub_proxy(proxy).map(|p| p.https)
}

async fn download_snapshot(
    model_id: &str,
    family: ModelFamily,
    options: &LoadOptions,
) -> Result<PathBuf, HubLoaderError> {
    tracing::info!(
        model_id = %model_id,
        family = ?family,
        cache_dir = ?options.cache_dir,
        "Starting model download via hf-hub"
    );

    let api = ApiBuilder::new()
        .with_cache_dir(options.cache_dir.clone())
        .with_progress(false)
        .build()
        .map_err(HubLoaderError::Client)?;

    let repo = api.model(model_id.to_string());
    let info = repo.info().await.map_err(|source| HubLoaderError::Info {
        model_id: model_id.to_string(),
        source,
    })?;

    let siblings: Vec<String> = info.siblings.into_iter().map(|s| s.rfilename).collect();
    let files = select_files(family, options.precision, &siblings);
    if !files.iter().any(|f| is_weight_file(f)) {
        return Err(HubLoaderError::NoWeights(model_id.to_string()));
    }

    for file in &files {
        tracing::debug!(model_id = %model_id, file = %file, "Downloading file");
        let fetched = if options.resume_download {
            // Reuses files already present in the cache
            repo.get(file).await
        } else {
            repo.download(file).await
        };
        fetched.map_err(|source| HubLoaderError::File {
            model_id: model_id.to_string(),
            file: file.clone(),
            source,
        })?;
    }

    let snapshot = options
        .cache_dir
        .join(model_id_to_cache_name(model_id))
        .join("snapshots")
        .join(&info.sha);

    tracing::info!(
        model_id = %model_id,
        files = files.len(),
        snapshot = ?snapshot,
        "Model download complete"
    );

    Ok(snapshot)
}

/// Convert model ID to cache directory name
///
/// HuggingFace uses `models--{org}--{name}` format
/// e.g., "runwayml/stable-diffusion-v1-5" -> "models--runwayml--stable-diffusion-v1-5"
fn model_id_to_cache_name(model_id: &str) -> String {
    format!("models--{}", model_id.replace('/', "--"))
}

fn is_weight_file(name: &str) -> bool {
    name.ends_with(".safetensors") || name.ends_with(".bin")
}

fn is_config_file(name: &str) -> bool {
    name.ends_with(".json") || name.ends_with(".txt") || name.ends_with(".model")
}

/// `unet/diffusion_pytorch_model.safetensors` -> `unet/diffusion_pytorch_model.fp16.safetensors`
fn fp16_variant(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.ends_with(".fp16") {
        return None;
    }
    Some(format!("{stem}.fp16.{ext}"))
}

fn is_fp16_variant(name: &str) -> bool {
    name.contains(".fp16.")
}

/// Directory of a repository file; root files map to the empty path
fn component_dir(name: &str) -> &Path {
    Path::new(name).parent().unwrap_or(Path::new(""))
}

/// Pick the files to fetch for a family
///
/// Within each component directory, safetensors weights are preferred over
/// `.bin`. For each weight with an fp16 variant, only the variant matching
/// `precision` is kept.
fn select_files(family: ModelFamily, precision: Precision, siblings: &[String]) -> Vec<String> {
    let safetensors_dirs: HashSet<&Path> = siblings
        .iter()
        .filter(|s| s.ends_with(".safetensors"))
        .map(|s| component_dir(s))
        .collect();
    let available: HashSet<&str> = siblings.iter().map(String::as_str).collect();

    let mut files = Vec::new();
    for name in siblings {
        if is_weight_file(name) {
            if !name.ends_with(".safetensors") && safetensors_dirs.contains(component_dir(name)) {
                continue;
            }

            let keep = if is_fp16_variant(name) {
                // Keep the fp16 variant unless full precision is asked for and a full file exists
                let full = name.replace(".fp16.", ".");
                precision == Precision::Half || !available.contains(full.as_str())
            } else {
                match fp16_variant(name) {
                    Some(variant) => {
                        precision == Precision::Full || !available.contains(variant.as_str())
                    }
                    None => true,
                }
            };

            if keep {
                files.push(name.clone());
            }
        } else if family.includes_configs() && is_config_file(name) {
            files.push(name.clone());
        }
    }

    files
}
