//! Proxy resolution
//!
//! Turns a [`ProxyConfig`] into the parameters each download path needs:
//! an `http`/`https` endpoint map for hub loaders, and an endpoint plus
//! optional basic-auth header for the URL fetcher.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::HeaderValue;

use crate::config::ProxyConfig;

/// Proxy endpoints handed to named-model loaders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubProxy {
    pub http: String,
    pub https: String,
}

/// Proxy parameters for the URL fetcher's HTTP client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpProxy {
    /// `host:port`
    pub endpoint: String,
    /// `Proxy-Authorization` value, set only when both credentials are present
    pub basic_auth: Option<HeaderValue>,
}

impl HttpProxy {
    /// Endpoint as a URL; a bare `host:port` is treated as plain HTTP
    pub fn url(&self) -> String {
        if self.endpoint.contains("://") {
            self.endpoint.clone()
        } else {
            format!("http://{}", self.endpoint)
        }
    }
}

fn endpoint(proxy: Option<&ProxyConfig>) -> Option<(&ProxyConfig, String)> {
    let proxy = proxy.filter(|p| p.is_enabled())?;
    Some((proxy, format!("{}:{}", proxy.host, proxy.port)))
}

/// Resolve the proxy map for named-model loaders
pub fn hub_proxy(proxy: Option<&ProxyConfig>) -> Option<HubProxy> {
    endpoint(proxy).map(|(_, endpoint)| HubProxy {
        http: endpoint.clone(),
        https: endpoint,
    })
}

/// Resolve the proxy for direct URL downloads
pub fn http_proxy(proxy: Option<&ProxyConfig>) -> Option<HttpProxy> {
    endpoint(proxy).map(|(proxy, endpoint)| HttpProxy {
        endpoint,
        basic_auth: basic_auth(&proxy.username, &proxy.password),
    })
}

fn basic_auth(username: &str, password: &str) -> Option<HeaderValue> {
    if username.is_empty() || password.is_empty() {
        return None;
    }

    let encoded = STANDARD.encode(format!("{}:{}", username, password));
    let mut value = HeaderValue::from_str(&format!("Basic {}", encoded)).ok()?;
    value.set_sensitive(true);
    Some(value)
}
