//! Task argument model slots and their resolution

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::ResolverConfig;
use crate::error::ResolveResult;
use crate::models::{ModelLoader, resolve_model};

/// Model slots of an inference task's arguments
///
/// Fields other than the model slots are kept in `extra` and written back
/// unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskArgs {
    pub base_model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vae: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controlnet: Option<ControlNetArgs>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lora: Option<LoraArgs>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub textual_inversion: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TaskArgs {
    pub fn new(base_model: impl Into<String>) -> Self {
        Self {
            base_model: base_model.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlNetArgs {
    pub model: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoraArgs {
    pub model: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Loaders for each model family a task can reference
#[derive(Debug, Clone)]
pub struct ModelLoaders<B, L, T> {
    /// Base model, VAE and ControlNet
    pub base: B,
    pub lora: L,
    pub textual_inversion: T,
}

/// Resolve every model slot of `args` in place
///
/// Slots are resolved one at a time in a fixed order: base model, VAE,
/// ControlNet, LoRA, textual inversion. The first failure is returned
/// immediately; slots resolved before it keep their new values and later
/// slots are left untouched.
pub async fn prepare_models<B, L, T>(
    args: &mut TaskArgs,
    loaders: &ModelLoaders<B, L, T>,
    config: &ResolverConfig,
) -> ResolveResult<()>
where
    B: ModelLoader,
    L: ModelLoader,
    T: ModelLoader,
{
    tracing::info!(base_model = %args.base_model, "Preparing task models");

    args.base_model = resolve_model(&args.base_model, &loaders.base, config)
        .await?
        .into_reference();

    if let Some(vae) = args.vae.as_mut() {
        *vae = resolve_model(vae, &loaders.base, config)
            .await?
            .into_reference();
    }

    if let Some(controlnet) = args.controlnet.as_mut() {
        controlnet.model = resolve_model(&controlnet.model, &loaders.base, config)
            .await?
            .into_reference();
    }

    if let Some(lora) = args.lora.as_mut() {
        lora.model = resolve_model(&lora.model, &loaders.lora, config)
            .await?
            .into_reference();
    }

    if let Some(textual_inversion) = args.textual_inversion.as_mut() {
        *textual_inversion = resolve_model(textual_inversion, &loaders.textual_inversion, config)
            .await?
            .into_reference();
    }

    Ok(())
}
