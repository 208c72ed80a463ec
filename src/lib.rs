//! SD Model Cache - model resolution for inference tasks
//!
//! Resolves the model references of an inference task into local artifacts.
//! Direct URLs are downloaded once into a content-addressed cache; repository
//! names are handed to a caller-supplied loader.

pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod proxy;
pub mod task;

pub use config::{ProxyConfig, ResolverConfig};
pub use error::{DownloadFailure, LoaderError, ResolveError, ResolveResult};
pub use models::{
    HubLoader, LoadOptions, ModelFamily, ModelLoader, ResolvedModel, resolve_model,
    unapplied_proxy,
};
pub use task::{ControlNetArgs, LoraArgs, ModelLoaders, TaskArgs, prepare_models};
