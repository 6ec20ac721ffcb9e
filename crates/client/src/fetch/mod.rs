//! How the controller reaches the origin.
//!
//! The controller only sees [`Network`]. [`HttpNetwork`] is the reqwest
//! implementation used by the server binary; tests script their own.
//!
//! Every HTTP status comes back as a [`Response`]. Transport failures and
//! bodies over `max_bytes` are the only errors, so a 404 or 500 reaches
//! the controller and is served without being stored.

pub mod url;

use async_trait::async_trait;
use bytes::BytesMut;
use futures_util::StreamExt;
use reqwest::{Client, Method, header};
use std::time::{Duration, Instant};

pub use self::url::{UrlError, resolve};

use pwa_cache_core::{AppConfig, Error, Request, Response};

#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    /// Bodies larger than this are abandoned mid-stream.
    pub max_bytes: usize,
    pub timeout: Duration,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            max_redirects: 5,
        }
    }
}

pub struct HttpNetwork {
    http: Client,
    config: FetchConfig,
}

impl HttpNetwork {
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    fn too_large(&self, url: &::url::Url, size: u64) -> Error {
        Error::FetchTooLarge(format!("{url}: {size} bytes exceeds {}", self.config.max_bytes))
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let started = Instant::now();
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|e| Error::InvalidInput(format!("invalid method {}: {e}", request.method)))?;

        let reply = self
            .http
            .request(method, request.url.as_str())
            .send()
            .await
            .map_err(|e| Error::Network(format!("{}: {e}", request.url)))?;

        let limit = self.config.max_bytes as u64;
        if let Some(declared) = reply.content_length().filter(|len| *len > limit) {
            return Err(self.too_large(&request.url, declared));
        }

        let status = reply.status().as_u16();
        let headers = collect_headers(reply.headers());

        let mut body = BytesMut::new();
        let mut chunks = reply.bytes_stream();
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(|e| Error::Network(format!("{}: reading body: {e}", request.url)))?;
            if (body.len() + chunk.len()) as u64 > limit {
                return Err(self.too_large(&request.url, (body.len() + chunk.len()) as u64));
            }
            body.extend_from_slice(&chunk);
        }

        tracing::debug!(
            method = %request.method,
            url = %request.url,
            status,
            bytes = body.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "network fetch"
        );

        Ok(Response { status, headers, body: body.freeze() })
    }
}

/// Header pairs in wire order. Values that are not visible ASCII are dropped.
fn collect_headers(headers: &header::HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter_map(|(name, value)| Some((name.as_str().to_string(), value.to_str().ok()?.to_string())))
        .collect()
}
