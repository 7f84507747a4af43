//! HTTP fetch pipeline.
//!
//! ### Behavior
//! - Plain GET, full body buffered in memory before returning.
//! - Non-2xx responses are errors; redirects are followed (max 5).
//! - Per-request timeout and body size limit from `FetchConfig`.
//!
//! The `Fetch` trait is the seam the page cache downloads through, so the
//! crawl pipeline can run against scripted pages.

pub mod url;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Url;
use reqwest::Client;
use std::time::{Duration, Instant};

pub use self::url::{UrlError, parse_url, resolve};

use savor_core::{AppConfig, Error};

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "savor/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "savor/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self { user_agent: config.user_agent.clone(), timeout: config.timeout(), ..Default::default() }
    }
}

/// Source of raw page bodies.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Download the full body of `url`.
    async fn get(&self, url: &Url) -> Result<Bytes, Error>;
}

/// HTTP fetch client.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
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
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Fetch a URL, returning the full response body.
    pub async fn fetch(&self, url: &Url) -> Result<Bytes, Error> {
        let start = Instant::now();

        let response = self
            .http
            .get(url.as_str())
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .send()
            .await
            .map_err(|e| network_error(url, e))?;

        let status = response.status();

        if !status.is_success() {
            return Err(Error::HttpError(format!("{}: status {}", url, status.as_u16())));
        }

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::HttpError(format!(
                "{}: {} bytes exceeds {}",
                url, len, self.config.max_bytes
            )));
        }

        let final_url = response.url().clone();
        let bytes = response.bytes().await.map_err(|e| network_error(url, e))?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::HttpError(format!(
                "{}: {} bytes exceeds {}",
                url,
                bytes.len(),
                self.config.max_bytes
            )));
        }

        tracing::debug!(
            "fetched {} -> {} in {}ms ({} bytes)",
            url,
            final_url,
            start.elapsed().as_millis(),
            bytes.len()
        );

        Ok(bytes)
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait]
impl Fetch for FetchClient {
    async fn get(&self, url: &Url) -> Result<Bytes, Error> {
        self.fetch(url).await
    }
}

fn network_error(url: &Url, err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::FetchTimeout(format!("{}: {}", url, err))
    } else {
        Error::HttpError(format!("{}: network error: {}", url, err))
    }
}
