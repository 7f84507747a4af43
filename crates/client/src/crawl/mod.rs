//! Paginated crawl engine.
//!
//! ### Generations
//! - An index page yields detail links and an optional next-page link.
//! - Every detail link of a page is scraped by a worker task; all workers of
//!   a page are joined before the next page is loaded.
//! - At most `max_concurrency` workers are in flight.
//! - A next link that points back to a page already visited ends the chain.
//!
//! ### Decode stage
//! - Workers send extracted reviews over a bounded channel to one decode
//!   task, which geocodes the address and keeps the review on success.
//! - The channel is closed once the last generation is joined; the decode
//!   task is then drained and joined.
//! - The decode task is owned by the `scrape` future and aborted with it, so
//!   a dropped crawl stops geocoding.
//!
//! ### Failures
//! - Fetch, extraction, and geocoding failures drop the item and are logged.
//! - Fatal errors (cache I/O, configuration) abort the crawl.
//! - `scrape_all_and_save` writes the geocode cache on every exit path,
//!   including fatal errors and shutdown.

use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use savor_core::{AppConfig, Coordinate, Error};
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use url::Url;

use crate::extract::{Adapter, AdapterRegistry, ExtractedReview};
use crate::fetch::parse_url;
use crate::geocode::GeoCache;
use crate::pages::PageCache;

/// A geocoded review, tagged with the adapter that extracted it.
#[derive(Debug, Clone)]
pub struct RawReview {
    pub name: String,
    pub address: String,
    pub url: Url,
    /// Category name to value in `[-1, 1]`.
    pub features: BTreeMap<String, f64>,
    pub weight: f64,
    pub coordinate: Coordinate,
    pub adapter: Arc<Adapter>,
}

/// Concurrency settings for a crawl.
#[derive(Debug, Clone, Copy)]
pub struct CrawlOptions {
    /// Detail workers in flight per generation (default: 16)
    pub max_concurrency: usize,
    /// Capacity of the review channel (default: 128)
    pub channel_capacity: usize,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self { max_concurrency: 16, channel_capacity: 128 }
    }
}

impl From<&AppConfig> for CrawlOptions {
    fn from(config: &AppConfig) -> Self {
        Self { max_concurrency: config.max_concurrency, channel_capacity: config.channel_capacity }
    }
}

type Extracted = (Url, ExtractedReview);

/// Crawl the index chain starting at `index_url` and return its reviews.
///
/// Review order is unspecified.
pub async fn scrape(
    index_url: Url, adapter: Arc<Adapter>, pages: Arc<PageCache>, geo: Arc<GeoCache>, options: CrawlOptions,
) -> Result<Vec<RawReview>, Error> {
    let (tx, rx) = mpsc::channel::<Extracted>(options.channel_capacity.max(1));

    let mut decoder = JoinSet::new();
    decoder.spawn(decode_reviews(rx, adapter.clone(), geo));

    let pages_visited = crawl_index(&index_url, &adapter, &pages, options, tx).await?;

    let reviews = match decoder.join_next().await {
        Some(joined) => joined.map_err(|e| Error::Internal(format!("decode stage for {}: {}", index_url, e)))??,
        None => return Err(Error::Internal(format!("decode stage for {} missing", index_url))),
    };

    tracing::info!(
        "{}: scraped {} reviews from {} index pages starting at {}",
        adapter.name(),
        reviews.len(),
        pages_visited,
        index_url
    );

    Ok(reviews)
}

/// Crawl every URL with the adapter registered for its host.
///
/// Every URL is matched before any crawling starts, so an unknown host fails
/// the batch without touching the network.
pub async fn scrape_all(
    urls: &[Url], registry: &AdapterRegistry, pages: Arc<PageCache>, geo: Arc<GeoCache>, options: CrawlOptions,
) -> Result<Vec<RawReview>, Error> {
    let jobs = urls
        .iter()
        .map(|url| registry.resolve(url).map(|adapter| (url.clone(), adapter)))
        .collect::<Result<Vec<_>, Error>>()?;

    let mut reviews = Vec::new();
    for (url, adapter) in jobs {
        tracing::info!("crawling {} with adapter {}", url, adapter.name());
        reviews.extend(scrape(url, adapter, pages.clone(), geo.clone(), options).await?);
    }

    Ok(reviews)
}

/// Run `scrape_all` until it finishes or `shutdown` resolves, then save the
/// geocode cache.
///
/// The cache is saved on every path. A crawl error takes precedence over a
/// save error; shutdown yields `Error::Interrupted`.
pub async fn scrape_all_and_save(
    urls: &[Url], registry: &AdapterRegistry, pages: Arc<PageCache>, geo: Arc<GeoCache>, options: CrawlOptions,
    shutdown: impl Future<Output = ()>,
) -> Result<Vec<RawReview>, Error> {
    let crawled = tokio::select! {
        biased;
        _ = shutdown => {
            tracing::warn!("shutdown requested, stopping crawl");
            Err(Error::Interrupted)
        }
        result = scrape_all(urls, registry, pages, geo.clone(), options) => result,
    };

    match (crawled, geo.save().await) {
        (Ok(reviews), Ok(())) => Ok(reviews),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), saved) => {
            if let Err(save_err) = saved {
                tracing::error!("failed to save geo cache: {}", save_err);
            }
            Err(e)
        }
    }
}

/// Read index URLs from a text file, one per line.
///
/// Blank lines and lines starting with `#` are skipped.
pub fn read_url_list(path: impl AsRef<Path>) -> Result<Vec<Url>, Error> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::InvalidInput(format!("cannot read URL list {}: {}", path.display(), e)))?;

    let mut urls = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let url = parse_url(line)
            .map_err(|e| Error::InvalidInput(format!("{}:{}: {}", path.display(), lineno + 1, e)))?;
        urls.push(url);
    }

    Ok(urls)
}

/// Walk the index chain. Returns the number of index pages loaded.
async fn crawl_index(
    start: &Url, adapter: &Arc<Adapter>, pages: &Arc<PageCache>, options: CrawlOptions, tx: mpsc::Sender<Extracted>,
) -> Result<usize, Error> {
    let semaphore = Arc::new(Semaphore::new(options.max_concurrency.max(1)));
    let mut visited: HashSet<String> = HashSet::new();
    let mut scheduled: HashSet<String> = HashSet::new();
    let mut current = Some(start.clone());

    while let Some(index_url) = current.take() {
        if !visited.insert(index_url.as_str().to_string()) {
            tracing::warn!("{}: index chain loops back to {}, stopping", adapter.name(), index_url);
            break;
        }

        let doc = match pages.load(&index_url).await {
            Ok(doc) => doc,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                tracing::warn!("{}: failed to load index {}: {}", adapter.name(), index_url, e);
                break;
            }
        };

        let page = adapter.index(&doc.parse(), &index_url);
        tracing::debug!(
            "{}: index {} lists {} items (cached: {})",
            adapter.name(),
            index_url,
            page.items.len(),
            doc.from_cache()
        );

        let mut join_set = JoinSet::new();
        for item_url in page.items {
            if !scheduled.insert(item_url.as_str().to_string()) {
                continue;
            }

            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| Error::Internal(format!("worker pool closed: {}", e)))?;
            let adapter = adapter.clone();
            let pages = pages.clone();
            let tx = tx.clone();

            join_set.spawn(async move {
                let _permit = permit;
                scrape_review(item_url, &adapter, &pages, &tx).await
            });
        }

        while let Some(result) = join_set.join_next().await {
            result.map_err(|e| Error::Internal(format!("review worker: {}", e)))??;
        }

        current = page.next;
    }

    Ok(visited.len())
}

/// Load and extract one detail page, forwarding the result to the decoder.
async fn scrape_review(
    url: Url, adapter: &Adapter, pages: &PageCache, tx: &mpsc::Sender<Extracted>,
) -> Result<(), Error> {
    let doc = match pages.load(&url).await {
        Ok(doc) => doc,
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => {
            tracing::warn!("{}: failed to load {}: {}", adapter.name(), url, e);
            return Ok(());
        }
    };

    let extracted = adapter.review(&doc.parse());
    let review = match extracted {
        Ok(review) => review,
        Err(e) => {
            tracing::warn!("{}: failed to extract {}: {}", adapter.name(), url, e);
            return Ok(());
        }
    };

    if tx.send((url, review)).await.is_err() {
        tracing::debug!("decode stage closed, dropping review");
    }

    Ok(())
}

async fn decode_reviews(
    mut rx: mpsc::Receiver<Extracted>, adapter: Arc<Adapter>, geo: Arc<GeoCache>,
) -> Result<Vec<RawReview>, Error> {
    let mut reviews = Vec::new();

    while let Some((url, review)) = rx.recv().await {
        match geo.decode(&review.address).await {
            Ok(coordinate) => {
                tracing::debug!("decoded {} at ({}, {})", url, coordinate.latitude, coordinate.longitude);
                reviews.push(RawReview {
                    name: review.name,
                    address: review.address,
                    url,
                    features: review.features,
                    weight: review.weight,
                    coordinate,
                    adapter: adapter.clone(),
                });
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => tracing::warn!("{}: failed to geocode {:?} for {}: {}", adapter.name(), review.address, url, e),
        }
    }

    Ok(reviews)
}
