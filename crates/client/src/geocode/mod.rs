//! Address geocoding with a persistent cache.
//!
//! `GeoCache` resolves addresses from memory first. Misses go through a
//! process-wide `RateLimiter` to the external `Geocoder` and are stored on
//! success; failed lookups are not remembered. The whole map is written back
//! to disk by `save`.

pub mod google;

use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use savor_core::{Coordinate, Error};
use serde::Serialize;

use crate::throttle::RateLimiter;

pub use google::GoogleGeocoder;

/// External address lookup.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve `address` to a coordinate.
    ///
    /// Returns `Error::ZeroResults` when the provider has no match.
    async fn geocode(&self, address: &str) -> Result<Coordinate, Error>;
}

/// Address to coordinate cache backed by a JSON file.
pub struct GeoCache {
    path: PathBuf,
    entries: Mutex<HashMap<String, Coordinate>>,
    geocoder: Arc<dyn Geocoder>,
    limiter: RateLimiter,
    /// Serializes misses so a pending address is looked up once.
    lookup: tokio::sync::Mutex<()>,
}

impl GeoCache {
    /// Load the cache file at `path`. A missing file yields an empty cache.
    ///
    /// # Errors
    ///
    /// - `Error::CacheIo` if the file exists but cannot be read
    /// - `Error::CacheCorrupt` if the file is not a JSON address map
    pub async fn load(path: impl AsRef<Path>, geocoder: Arc<dyn Geocoder>, interval: Duration) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<HashMap<String, Coordinate>>(&bytes)
                .map_err(|e| Error::CacheCorrupt(format!("{}: {}", path.display(), e)))?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!("no geo cache at {}, starting empty", path.display());
                HashMap::new()
            }
            Err(e) => return Err(Error::cache_io(&path, e)),
        };

        tracing::info!("loaded {} geo cache entries from {}", entries.len(), path.display());

        Ok(Self {
            path,
            entries: Mutex::new(entries),
            geocoder,
            limiter: RateLimiter::new(interval),
            lookup: tokio::sync::Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cached(&self, address: &str) -> Option<Coordinate> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).get(address).copied()
    }

    /// Resolve `address`, consulting the external geocoder only on a miss.
    pub async fn decode(&self, address: &str) -> Result<Coordinate, Error> {
        if let Some(coord) = self.cached(address) {
            return Ok(coord);
        }

        let _guard = self.lookup.lock().await;
        if let Some(coord) = self.cached(address) {
            return Ok(coord);
        }

        self.limiter.acquire().await;
        let coord = self.geocoder.geocode(address).await?;

        tracing::debug!("geocoded {:?} -> ({}, {})", address, coord.latitude, coord.longitude);

        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(address.to_string(), coord);

        Ok(coord)
    }

    /// Write every entry to the cache file as 4-space-indented JSON.
    ///
    /// A lookup in progress is waited for, so its result is written too.
    pub async fn save(&self) -> Result<(), Error> {
        let _guard = self.lookup.lock().await;
        let snapshot: BTreeMap<String, Coordinate> = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        snapshot
            .serialize(&mut ser)
            .map_err(|e| Error::CacheCorrupt(format!("{}: {}", self.path.display(), e)))?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::cache_io(parent, e))?;
        }

        tokio::fs::write(&self.path, &buf)
            .await
            .map_err(|e| Error::cache_io(&self.path, e))?;

        tracing::info!("saved {} geo cache entries to {}", snapshot.len(), self.path.display());
        Ok(())
    }
}
