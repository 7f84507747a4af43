//! Domain types shared between the crawler and the dataset writer.

use serde::{Deserialize, Serialize};

/// A geographic point in decimal degrees.
///
/// Serialized with capitalized keys to match the geo cache and station files.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinate {
    #[serde(rename = "Latitude")]
    pub latitude: f64,
    #[serde(rename = "Longitude")]
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Canonical four-axis restaurant feature vector.
///
/// Adapters also use this type for the per-category weight table returned by
/// `define`, so every field defaults to zero when omitted from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Semantics {
    pub accommodating: f64,
    pub affordable: f64,
    pub atmospheric: f64,
    pub delicious: f64,
}

impl Semantics {
    pub const ZERO: Semantics = Semantics { accommodating: 0.0, affordable: 0.0, atmospheric: 0.0, delicious: 0.0 };

    /// Add `other` scaled by `weight` to this vector.
    pub fn combine(self, other: Semantics, weight: f64) -> Semantics {
        Semantics {
            accommodating: self.accommodating + other.accommodating * weight,
            affordable: self.affordable + other.affordable * weight,
            atmospheric: self.atmospheric + other.atmospheric * weight,
            delicious: self.delicious + other.delicious * weight,
        }
    }

    /// Divide every axis by `weight`.
    pub fn reduce(self, weight: f64) -> Semantics {
        Semantics {
            accommodating: self.accommodating / weight,
            affordable: self.affordable / weight,
            atmospheric: self.atmospheric / weight,
            delicious: self.delicious / weight,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Semantics::ZERO
    }
}

/// A named station from the reference set.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub name: String,
    pub coordinate: Coordinate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_serialization_keys() {
        let json = serde_json::to_string(&Coordinate::new(35.5, 139.6)).unwrap();
        assert_eq!(json, r#"{"Latitude":35.5,"Longitude":139.6}"#);
    }

    #[test]
    fn test_semantics_combine_and_reduce() {
        let weights = Semantics { delicious: 0.8, ..Default::default() };
        let sum = Semantics::ZERO.combine(weights, 10.0).combine(weights, 30.0);
        assert!((sum.delicious - 32.0).abs() < 1e-9);

        let avg = sum.reduce(40.0);
        assert!((avg.delicious - 0.8).abs() < 1e-9);
        assert_eq!(avg.accommodating, 0.0);
    }

    #[test]
    fn test_semantics_partial_deserialize() {
        let sem: Semantics = serde_json::from_str(r#"{"affordable": 1.0}"#).unwrap();
        assert_eq!(sem.affordable, 1.0);
        assert_eq!(sem.delicious, 0.0);
        assert!(!sem.is_zero());
        assert!(Semantics::default().is_zero());
    }
}
