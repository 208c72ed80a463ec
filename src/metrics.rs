//! Cache and download metrics
//!
//! Recorded through the `metrics` facade; installing an exporter is left to
//! the embedding application.

/// Record a URL model served from the external cache
pub fn record_cache_hit() {
    metrics::counter!("sd_model_cache_hits_total").increment(1);
}

/// Record a finished URL download attempt
pub fn record_download(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!("sd_model_cache_downloads_total",
        "outcome" => outcome
    )
    .increment(1);
}

/// Record bytes written to the external cache
pub fn record_download_bytes(bytes: u64) {
    metrics::counter!("sd_model_cache_download_bytes_total").increment(bytes);
}

/// Record a named model handed to an external loader
pub fn record_named_load() {
    metrics::counter!("sd_model_cache_named_loads_total").increment(1);
}
