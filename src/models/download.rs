//! Direct URL model downloads
//!
//! Streams a remote artifact into the external cache under a directory named
//! by the SHA-256 of its URL. A URL is downloaded at most once: later calls
//! find `model.safetensors` in place and skip the network entirely.

use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;

use super::cache::{identifier_digest, is_cache_hit, prepare_cache_dir};
use crate::error::{DownloadFailure, ResolveError, ResolveResult};
use crate::metrics;
use crate::proxy::HttpProxy;

/// Size of each write to the artifact file
pub const DOWNLOAD_CHUNK_SIZE: usize = 1024;

const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

/// Download a URL model into the external cache
///
/// # Arguments
/// * `url` - Direct download URL, also the cache key
/// * `external_cache_root` - Root of the external cache
/// * `proxy` - Optional proxy to route the request through
///
/// # Returns
/// * `Ok(PathBuf)` - The cache directory containing `model.safetensors`
/// * `Err(ResolveError)` - Cache directory creation or download failure. A
///   failed download never leaves a file behind; the directory is kept.
pub async fn download_url_model(
    url: &str,
    external_cache_root: &Path,
    proxy: Option<&HttpProxy>,
) -> ResolveResult<PathBuf> {
    let log_url = redact_url(url);
    tracing::info!(url = %log_url, "Checking external model cache");

    let paths = prepare_cache_dir(url, external_cache_root).await?;

    if is_cache_hit(&paths).await {
        tracing::info!(url = %log_url, path = ?paths.file, "Found cached model file, skipping download");
        metrics::record_cache_hit();
        return Ok(paths.dir);
    }

    tracing::info!(url = %log_url, path = ?paths.file, "Model file not cached, starting download");

    match stream_to_file(url, &paths.file, proxy).await {
        Ok(bytes) => {
            metrics::record_download(true);
            metrics::record_download_bytes(bytes);
            tracing::info!(url = %log_url, path = ?paths.file, bytes, "Model download complete");
            Ok(paths.dir)
        }
        Err(source) => {
            metrics::record_download(false);
            tracing::error!(url = %log_url, error = %source, "Model download failed");
            remove_partial_file(&paths.file).await;
            Err(ResolveError::Download {
                url: url.to_string(),
                source,
            })
        }
    }
}

/// `url` with credentials, query string and fragment removed, for log output
///
/// Signed download links carry their tokens in the query. Unparseable input
/// is replaced by its cache digest.
pub fn redact_url(url: &str) -> String {
    match reqwest::Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.set_fragment(None);
            // Fails only for cannot-be-a-base URLs, which carry no credentials
            let _ = parsed.set_username("");
            let _ = parsed.set_password(None);
            parsed.to_string()
        }
        Err(_) => format!("sha256:{}", identifier_digest(url)),
    }
}

/// Build a single-use HTTP client, routed through `proxy` when set
///
/// Without a proxy, ambient `HTTP(S)_PROXY` variables are ignored so the
/// configured policy is the only one that applies.
fn build_client(proxy: Option<&HttpProxy>) -> Result<reqwest::Client, reqwest::Error> {
    let builder = reqwest::Client::builder().pool_max_idle_per_host(1);

    let builder = match proxy {
        Some(proxy) => {
            tracing::info!(proxy = %proxy.endpoint, "Downloading through proxy");
            let mut route = reqwest::Proxy::all(proxy.url())?;
            if let Some(auth) = &proxy.basic_auth {
                route = route.custom_http_auth(auth.clone());
            }
            builder.proxy(route)
        }
        None => builder.no_proxy(),
    };

    builder.build()
}

/// Fetch `url` and write the body to `file`, returning the byte count
async fn stream_to_file(
    url: &str,
    file: &Path,
    proxy: Option<&HttpProxy>,
) -> Result<u64, DownloadFailure> {
    let client = build_client(proxy)?;

    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(DownloadFailure::Status(status));
    }

    let mut progress = Progress::new(file, response.content_length());
    let mut out = tokio::fs::File::create(file).await?;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        for piece in chunk.chunks(DOWNLOAD_CHUNK_SIZE) {
            out.write_all(piece).await?;
            progress.advance(piece.len());
        }
    }
    out.flush().await?;

    Ok(progress.downloaded)
}

async fn remove_partial_file(file: &Path) {
    match tokio::fs::remove_file(file).await {
        Ok(()) => tracing::warn!(path = ?file, "Removed partially downloaded model file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::error!(
            path = ?file,
            error = %e,
            "Failed to remove partially downloaded model file"
        ),
    }
}

/// Rate-limited download progress, emitted as tracing events
struct Progress<'a> {
    file: &'a Path,
    total: Option<u64>,
    downloaded: u64,
    last_emit: Instant,
}

impl<'a> Progress<'a> {
    fn new(file: &'a Path, total: Option<u64>) -> Self {
        tracing::debug!(path = ?file, total_bytes = ?total, "Download started");
        Self {
            file,
            total,
            downloaded: 0,
            last_emit: Instant::now(),
        }
    }

    fn advance(&mut self, bytes: usize) {
        self.downloaded += bytes as u64;

        if self.last_emit.elapsed() >= PROGRESS_INTERVAL || self.is_complete() {
            tracing::debug!(
                path = ?self.file,
                downloaded_bytes = self.downloaded,
                total_bytes = ?self.total,
                percent = ?self.percent(),
                "Download progress"
            );
            self.last_emit = Instant::now();
        }
    }

    /// `None` when the server sent no `content-length`
    fn percent(&self) -> Option<u32> {
        match self.total {
            Some(0) => Some(100),
            Some(total) => Some(((self.downloaded as f64 / total as f64) * 100.0) as u32),
            None => None,
        }
    }

    fn is_complete(&self) -> bool {
        self.total == Some(self.downloaded)
    }
}
