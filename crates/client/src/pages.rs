//! Page cache: disk first, network on miss.
//!
//! A cached page is returned without touching the network. On a miss the
//! body is downloaded in full, persisted verbatim, and then parsed from the
//! in-memory buffer. Downloads share one `RateLimiter`; cache hits are never
//! throttled.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use savor_core::{Error, PageStore};
use scraper::Html;
use url::Url;

use crate::fetch::Fetch;
use crate::throttle::RateLimiter;

/// A loaded page body.
#[derive(Debug, Clone)]
pub struct Document {
    body: Bytes,
    cached: bool,
}

impl Document {
    #[cfg(test)]
    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Whether the body came from disk rather than the network.
    pub fn from_cache(&self) -> bool {
        self.cached
    }

    /// Parse the body as HTML. Invalid UTF-8 sequences are replaced.
    pub fn parse(&self) -> Html {
        Html::parse_document(&String::from_utf8_lossy(&self.body))
    }
}

/// URL-addressed page cache backed by a `PageStore`.
pub struct PageCache {
    store: PageStore,
    fetcher: Arc<dyn Fetch>,
    limiter: RateLimiter,
}

impl PageCache {
    pub fn new(store: PageStore, fetcher: Arc<dyn Fetch>, fetch_interval: Duration) -> Self {
        Self { store, fetcher, limiter: RateLimiter::new(fetch_interval) }
    }

    pub fn store(&self) -> &PageStore {
        &self.store
    }

    /// Load `url` from disk, or download and persist it.
    ///
    /// # Errors
    ///
    /// - `Error::CacheIo` if the cached file cannot be read or the new body
    ///   cannot be written
    /// - `Error::HttpError` / `Error::FetchTimeout` if the download fails
    pub async fn load(&self, url: &Url) -> Result<Document, Error> {
        if let Some(body) = self.store.read(url.as_str()).await? {
            tracing::debug!("page cache hit for {}", url);
            return Ok(Document { body: Bytes::from(body), cached: true });
        }

        self.limiter.acquire().await;

        let body = self.fetcher.get(url).await?;
        self.store.write(url.as_str(), &body).await?;

        tracing::debug!("page cache stored {} ({} bytes)", url, body.len());

        Ok(Document { body, cached: false })
    }
}
