//! savor-build entry point.
//!
//! Crawls every index URL in the URL list, geocodes and collates the reviews,
//! and writes the restaurant dataset for the ranking service.
//! Logs are JSON on stderr; `RUST_LOG` overrides the default `info` level.

use std::sync::Arc;

use anyhow::Result;
use savor_client::{
    AdapterRegistry, CrawlOptions, FetchClient, FetchConfig, GeoCache, GoogleGeocoder, PageCache, collate,
    compute_semantics, compute_stations, read_url_list, scrape_all_and_save, to_rows,
};
use savor_core::{AppConfig, DatasetDb, PageStore, StationIndex};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!("starting dataset build with {:?}", config.urls_path);

    run(&config).await
}

async fn run(config: &AppConfig) -> Result<()> {
    let urls = read_url_list(&config.urls_path)?;
    let registry = AdapterRegistry::load_dir(&config.adapters_dir)?;
    let stations = StationIndex::load(&config.stations_path)?;

    let fetcher = Arc::new(FetchClient::new(FetchConfig::from(config))?);
    let pages = Arc::new(PageCache::new(PageStore::open(&config.webcache_dir)?, fetcher, config.fetch_interval()));
    let geocoder = Arc::new(GoogleGeocoder::from_config(config)?);
    let geo = Arc::new(GeoCache::load(&config.geocache_path, geocoder, config.geocode_interval()).await?);

    tracing::info!(
        urls = urls.len(),
        adapters = registry.len(),
        stations = stations.len(),
        cached_addresses = geo.len(),
        "crawl starting"
    );

    let reviews =
        scrape_all_and_save(&urls, &registry, pages, geo, CrawlOptions::from(config), shutdown_signal()).await?;
    let review_count = reviews.len();

    let mut restaurants = collate(reviews, config.coordinate_precision);
    compute_semantics(&mut restaurants);
    compute_stations(&mut restaurants, &stations);
    let rows = to_rows(&restaurants);

    let db = DatasetDb::open(&config.db_path).await?;
    let written = db.write_restaurants(rows).await?;

    tracing::info!(
        reviews = review_count,
        restaurants = restaurants.len(),
        rows = written,
        db = %config.db_path.display(),
        "dataset build complete"
    );

    Ok(())
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
