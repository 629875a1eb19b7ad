//! Origins that serve the protected content once a request is let through.

use crate::config::{Config, OriginConfig};
use crate::error::AppError;
use async_trait::async_trait;
use axum::{
    body::{Body, HttpBody},
    extract::Request,
    http::{header, HeaderMap, HeaderName, Uri},
    response::Response,
};
use reqwest::Url;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use tower_http::services::ServeDir;

/// Headers that describe a single connection and must not be forwarded.
static HOP_BY_HOP_HEADERS: [HeaderName; 9] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    HeaderName::from_static("proxy-connection"),
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// A backend that answers requests the gate has admitted.
#[async_trait]
pub trait Origin: Send + Sync {
    /// Forward `request` unchanged and return the origin's response.
    async fn forward(&self, request: Request) -> Result<Response, AppError>;
}

/// Build the origin described by the configuration, if any.
pub fn from_config(config: &Config) -> Result<Option<Arc<dyn Origin>>, AppError> {
    let origin: Arc<dyn Origin> = match &config.origin {
        OriginConfig::None => return Ok(None),
        OriginConfig::AssetsDir(dir) => Arc::new(StaticDir::new(dir)),
        OriginConfig::Upstream(url) => Arc::new(Upstream::new(
            url.clone(),
            Duration::from_secs(config.upstream_timeout_secs),
        )?),
    };
    Ok(Some(origin))
}

/// Serves files from a directory on disk.
#[derive(Clone)]
pub struct StaticDir {
    serve_dir: ServeDir,
}

impl StaticDir {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            serve_dir: ServeDir::new(path),
        }
    }
}

#[async_trait]
impl Origin for StaticDir {
    async fn forward(&self, request: Request) -> Result<Response, AppError> {
        let response = match self.serve_dir.clone().oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        };
        Ok(response.map(Body::new))
    }
}

/// Proxies requests to another HTTP service.
pub struct Upstream {
    client: reqwest::Client,
    base: Url,
}

impl Upstream {
    pub fn new(base: Url, timeout: Duration) -> Result<Self, AppError> {
        // Redirects belong to the browser, not to us
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base })
    }

    /// Map an inbound request URI onto the upstream base URL.
    ///
    /// `Url` resolves `..` and `%2e%2e` segments, so the result is checked against the
    /// base path and anything that lands outside it is refused.
    pub fn target_url(&self, uri: &Uri) -> Result<Url, AppError> {
        let prefix = self.base.path().trim_end_matches('/');

        let mut url = self.base.clone();
        url.set_path(&format!("{}{}", prefix, uri.path()));
        url.set_query(uri.query());

        let path = url.path();
        let inside = prefix.is_empty()
            || path == prefix
            || path.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/'));
        if !inside {
            return Err(AppError::NotFound(format!(
                "{} resolves outside {}",
                uri.path(),
                self.base.path()
            )));
        }

        Ok(url)
    }
}

/// Remove hop-by-hop headers, including any extra ones listed in `Connection`.
fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in named.iter().chain(HOP_BY_HOP_HEADERS.iter()) {
        headers.remove(name);
    }
}

#[async_trait]
impl Origin for Upstream {
    async fn forward(&self, request: Request) -> Result<Response, AppError> {
        let (parts, body) = request.into_parts();
        let url = self.target_url(&parts.uri)?;

        let mut headers = parts.headers;
        headers.remove(header::HOST);
        strip_hop_by_hop(&mut headers);

        tracing::debug!(method = %parts.method, url = %url, "Forwarding to upstream");

        // Bodies are streamed in both directions and never buffered whole
        let mut outbound = self.client.request(parts.method, url).headers(headers);
        if !body.is_end_stream() {
            outbound = outbound.body(reqwest::Body::wrap_stream(body.into_data_stream()));
        }
        let upstream = outbound.send().await?;

        let status = upstream.status();
        let mut headers = upstream.headers().clone();
        strip_hop_by_hop(&mut headers);

        let mut response = Response::builder()
            .status(status)
            .body(Body::from_stream(upstream.bytes_stream()))
            .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))?;
        *response.headers_mut() = headers;

        Ok(response)
    }
}
