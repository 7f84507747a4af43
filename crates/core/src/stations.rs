//! Nearest-station lookup over a small reference set.
//!
//! Stations are kept sorted by name and scanned linearly; when two stations
//! are equally distant the one whose name sorts first wins.

use std::collections::BTreeMap;
use std::path::Path;

use crate::Error;
use crate::geo::great_circle_distance;
use crate::model::{Coordinate, Station};

/// Read-only station reference set.
#[derive(Debug, Clone, Default)]
pub struct StationIndex {
    stations: Vec<Station>,
}

impl StationIndex {
    /// Load stations from a JSON object of `{name: {Latitude, Longitude}}`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| Error::cache_io(path, e))?;
        let parsed: BTreeMap<String, Coordinate> = serde_json::from_slice(&bytes)
            .map_err(|e| Error::Config(format!("invalid station data in {}: {}", path.display(), e)))?;

        tracing::debug!("loaded {} stations from {}", parsed.len(), path.display());

        Ok(Self::from_stations(parsed.into_iter().map(|(name, coordinate)| Station { name, coordinate })))
    }

    pub fn from_stations(stations: impl IntoIterator<Item = Station>) -> Self {
        let mut stations: Vec<Station> = stations.into_iter().collect();
        stations.sort_by(|a, b| a.name.cmp(&b.name));
        Self { stations }
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Closest station to `point` and its distance in kilometers.
    ///
    /// Returns `None` only when the index is empty.
    pub fn closest(&self, point: Coordinate) -> Option<(&Station, f64)> {
        let mut best: Option<(&Station, f64)> = None;

        for station in &self.stations {
            let dist = great_circle_distance(point, station.coordinate);
            match best {
                Some((_, min)) if dist >= min => {}
                _ => best = Some((station, dist)),
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station(name: &str, lat: f64, lng: f64) -> Station {
        Station { name: name.to_string(), coordinate: Coordinate::new(lat, lng) }
    }

    #[test]
    fn test_coincident_station_has_zero_distance() {
        let index = StationIndex::from_stations([
            station("Yokohama", 35.4658, 139.6223),
            station("Sakuragicho", 35.4510, 139.6312),
        ]);

        let (nearest, dist) = index.closest(Coordinate::new(35.4510, 139.6312)).unwrap();
        assert_eq!(nearest.name, "Sakuragicho");
        assert!(dist.abs() < 1e-9);
    }

    #[test]
    fn test_tie_breaks_by_name() {
        let index = StationIndex::from_stations([station("Zushi", 0.0, 1.0), station("Aobadai", 0.0, -1.0)]);

        let (nearest, _) = index.closest(Coordinate::new(0.0, 0.0)).unwrap();
        assert_eq!(nearest.name, "Aobadai");
    }

    #[test]
    fn test_empty_index() {
        let index = StationIndex::default();
        assert!(index.is_empty());
        assert!(index.closest(Coordinate::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stations.json");
        std::fs::write(
            &path,
            r#"{
                "Kannai": {"Latitude": 35.4433, "Longitude": 139.6366},
                "Yokohama": {"Latitude": 35.4658, "Longitude": 139.6223}
            }"#,
        )
        .unwrap();

        let index = StationIndex::load(&path).unwrap();
        assert_eq!(index.len(), 2);

        let (nearest, dist) = index.closest(Coordinate::new(35.4650, 139.6220)).unwrap();
        assert_eq!(nearest.name, "Yokohama");
        assert!(dist < 0.2);
    }

    #[test]
    fn test_load_missing_file_is_cache_io() {
        let result = StationIndex::load("/nonexistent/stations.json");
        assert!(matches!(result, Err(Error::CacheIo { .. })));
    }

    #[test]
    fn test_load_malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stations.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        assert!(matches!(StationIndex::load(&path), Err(Error::Config(_))));
    }
}
