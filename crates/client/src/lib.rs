//! Client code for savor.
//!
//! This crate provides the network-facing half of the pipeline: the HTTP
//! fetch client, the page and geocode caches, the declarative extraction
//! adapters, the paginated crawl engine, and the collation/aggregation steps
//! that turn raw reviews into restaurant rows.

pub mod aggregate;
pub mod collate;
pub mod crawl;
pub mod extract;
pub mod fetch;
pub mod geocode;
pub mod pages;
pub mod throttle;

#[cfg(test)]
pub(crate) mod test_support;

pub use aggregate::{compute_semantics, compute_stations, to_rows};
pub use collate::{Restaurant, collate, identity_hash};
pub use crawl::{CrawlOptions, RawReview, read_url_list, scrape, scrape_all, scrape_all_and_save};
pub use extract::{Adapter, AdapterConfig, AdapterRegistry, Rule};
pub use fetch::{Fetch, FetchClient, FetchConfig};
pub use geocode::{GeoCache, Geocoder, GoogleGeocoder};
pub use pages::{Document, PageCache};
pub use throttle::RateLimiter;
