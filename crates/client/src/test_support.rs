//! Scripted collaborators for tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use savor_core::{Coordinate, Error};
use tokio::sync::Notify;
use url::Url;

use crate::crawl::RawReview;
use crate::extract::Adapter;
use crate::fetch::Fetch;
use crate::geocode::Geocoder;

/// Adapter for `www.example.com` used across the extraction and crawl tests.
pub const EXAMPLE_ADAPTER: &str = r##"
    name = "example"
    domains = ["www.example.com"]

    [index.items]
    path = "ul.list a.rst"
    attr = "href"

    [index.next]
    path = "a.next"
    attr = "href"

    [item.name]
    path = "h1"

    [item.address]
    path = "p.address"

    [item.count]
    path = "span.count"
    regex = '(\d+)'

    [item.props.food]
    scale = 5.0
    selector = { path = "dd.food" }
    semantics = { delicious = 0.8, atmospheric = 0.1 }

    [item.props.service]
    scale = 5.0
    selector = { path = "dd.service" }
    semantics = { accommodating = 1.0 }
"##;

/// A geocoded review with a single review of weight 1 and neutral ratings.
pub fn review(adapter: &Arc<Adapter>, url: &str, name: &str, latitude: f64, longitude: f64) -> RawReview {
    RawReview {
        name: name.to_string(),
        address: format!("{name} address"),
        url: Url::parse(url).unwrap(),
        features: BTreeMap::from([("food".to_string(), 0.0), ("service".to_string(), 0.0)]),
        weight: 1.0,
        coordinate: Coordinate::new(latitude, longitude),
        adapter: adapter.clone(),
    }
}

/// In-memory page source that counts requests per URL.
///
/// Every request logs `start <url>` and `end <url>` events and yields a few
/// times in between, so concurrent requests overlap. Unknown URLs fail with
/// `Error::HttpError` (status 404).
#[derive(Default)]
pub struct ScriptedFetch {
    pages: HashMap<String, Bytes>,
    calls: Mutex<HashMap<String, usize>>,
    events: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedFetch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, body: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), Bytes::from(body.into()));
        self
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    /// Position of `event` in the request log.
    pub fn event_index(&self, event: &str) -> Option<usize> {
        self.events.lock().unwrap().iter().position(|e| e == event)
    }

    /// Most requests in flight at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetch for ScriptedFetch {
    async fn get(&self, url: &Url) -> Result<Bytes, Error> {
        *self.calls.lock().unwrap().entry(url.as_str().to_string()).or_default() += 1;
        self.events.lock().unwrap().push(format!("start {}", url));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        for _ in 0..3 {
            tokio::task::yield_now().await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.events.lock().unwrap().push(format!("end {}", url));

        self.pages
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| Error::HttpError(format!("{}: status 404", url)))
    }
}

/// Holds a geocode lookup open until released.
#[derive(Default)]
pub struct Gate {
    /// Notified when a lookup reaches the gate.
    pub entered: Notify,
    /// Notify to let the lookup finish.
    pub release: Notify,
}

/// In-memory geocoder that counts lookups per address.
///
/// Unknown addresses fail with `Error::ZeroResults`.
#[derive(Default)]
pub struct ScriptedGeocoder {
    coordinates: HashMap<String, Coordinate>,
    calls: Mutex<HashMap<String, usize>>,
    gate: Option<Arc<Gate>>,
}

impl ScriptedGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn address(mut self, address: &str, latitude: f64, longitude: f64) -> Self {
        self.coordinates.insert(address.to_string(), Coordinate::new(latitude, longitude));
        self
    }

    /// Make every lookup wait at the returned gate.
    pub fn gated(mut self) -> (Self, Arc<Gate>) {
        let gate = Arc::new(Gate::default());
        self.gate = Some(gate.clone());
        (self, gate)
    }

    pub fn calls(&self, address: &str) -> usize {
        self.calls.lock().unwrap().get(address).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl Geocoder for ScriptedGeocoder {
    async fn geocode(&self, address: &str) -> Result<Coordinate, Error> {
        *self.calls.lock().unwrap().entry(address.to_string()).or_default() += 1;
        tokio::task::yield_now().await;

        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        self.coordinates
            .get(address)
            .copied()
            .ok_or_else(|| Error::ZeroResults(address.to_string()))
    }
}
