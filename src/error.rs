//! Error types for model resolution

use std::path::PathBuf;
use thiserror::Error;

use crate::models::download::redact_url;

/// Error returned by a [`ModelLoader`](crate::models::ModelLoader)
///
/// Boxed so loaders for different model families can be driven by the same
/// resolution pass without a shared error type.
pub type LoaderError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Model resolution errors
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Failed to create cache directory {path:?}: {source}")]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `url` is kept whole; the message shows it redacted
    #[error("Failed to download {}: {source}", redact_url(.url))]
    Download {
        url: String,
        #[source]
        source: DownloadFailure,
    },

    /// Raised by an external loader, passed through untouched
    #[error(transparent)]
    Loader(LoaderError),
}

/// Underlying cause of a failed URL download
#[derive(Debug, Error)]
pub enum DownloadFailure {
    #[error("HTTP client error: {0}")]
    Http(reqwest::Error),

    #[error("server responded with HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Drops the request URL, which [`ResolveError::Download`] already carries
impl From<reqwest::Error> for DownloadFailure {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.without_url())
    }
}

pub type ResolveResult<T> = Result<T, ResolveError>;
