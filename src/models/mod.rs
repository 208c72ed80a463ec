//! Model resolution module
//!
//! Provides functionality for:
//! - Computing the content-addressed cache location of URL models
//! - Downloading URL models into the external cache
//! - Delegating named models to repository-aware loaders
//! - Loading named models from the HuggingFace Hub
//! - Classifying identifiers and dispatching to the right fetcher

pub mod cache;
pub mod download;
pub mod hub;
pub mod loader;
pub mod resolve;

pub use cache::{CachePaths, MODEL_FILE_NAME, cache_paths, get_cache_dir, prepare_cache_dir};
pub use download::download_url_model;
pub use hub::{HubLoader, HubLoaderError, ModelFamily, unapplied_proxy};
pub use loader::{LoadOptions, ModelLoader, Precision, load_named_model};
pub use resolve::{ResolvedModel, is_url, resolve_model};
