//! Google Geocoding API client.
//!
//! - **Endpoint**: `https://maps.googleapis.com/maps/api/geocode/json`
//! - **Authentication**: `key` query parameter.
//! - **Status handling**: `OK` yields the first result, `ZERO_RESULTS` maps to
//!   `Error::ZeroResults`, anything else to `Error::GeocodeFailed`.
//!
//! Throttling is the caller's job (see `GeoCache`).

use async_trait::async_trait;
use reqwest::header;
use savor_core::{AppConfig, Coordinate, Error};
use serde::Deserialize;
use std::time::Duration;

use super::Geocoder;

/// Default base URL for the Google Maps APIs.
const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api";

/// Raw response from the geocoding endpoint.
#[derive(Debug, Deserialize)]
pub struct GeocodeResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GeocodeResult {
    pub geometry: Geometry,
    #[serde(default)]
    pub formatted_address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
}

#[derive(Debug, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl GeocodeResponse {
    /// Convert a raw response for `address` into a coordinate.
    pub fn into_coordinate(self, address: &str) -> Result<Coordinate, Error> {
        match self.status.as_str() {
            "OK" => self
                .results
                .into_iter()
                .next()
                .map(|r| Coordinate::new(r.geometry.location.lat, r.geometry.location.lng))
                .ok_or_else(|| Error::ZeroResults(address.to_string())),
            "ZERO_RESULTS" => Err(Error::ZeroResults(address.to_string())),
            status => Err(Error::GeocodeFailed(match self.error_message {
                Some(msg) => format!("{}: {} ({})", address, status, msg),
                None => format!("{}: {}", address, status),
            })),
        }
    }
}

/// Google geocoding client.
#[derive(Debug, Clone)]
pub struct GoogleGeocoder {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    user_agent: String,
    timeout: Duration,
}

impl GoogleGeocoder {
    pub fn new(api_key: Option<String>, user_agent: &str, timeout: Duration) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build geocoder client: {}", e)))?;

        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            user_agent: user_agent.to_string(),
            timeout,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let api_key = match config.require_geocode_api_key() {
            Ok(key) => Some(key.to_string()),
            Err(e) => {
                tracing::warn!("{}; uncached addresses will likely fail to geocode", e);
                None
            }
        };
        Self::new(api_key, &config.user_agent, config.timeout())
    }

    /// Point the client at a different API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn geocode(&self, address: &str) -> Result<Coordinate, Error> {
        let url = format!("{}/geocode/json", self.base_url);

        let mut query = vec![("address", address)];
        if let Some(key) = self.api_key.as_deref() {
            query.push(("key", key));
        }

        tracing::debug!("geocoding address: {} (timeout {:?})", address, self.timeout);

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .header(header::USER_AGENT, &self.user_agent)
            .query(&query)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::FetchTimeout(format!("geocode {}: {}", address, e))
                } else {
                    Error::GeocodeFailed(format!("{}: network error: {}", address, e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::GeocodeFailed(format!("{}: HTTP status {}", address, status.as_u16())));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::GeocodeFailed(format!("{}: failed to read response: {}", address, e)))?;

        let parsed: GeocodeResponse = serde_json::from_slice(&bytes)
            .map_err(|e| Error::GeocodeFailed(format!("{}: parse error: {}", address, e)))?;

        parsed.into_coordinate(address)
    }
}
