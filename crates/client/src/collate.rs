//! Merge reviews of the same restaurant across sites.
//!
//! Two reviews belong to the same restaurant when their names match exactly
//! and their coordinates agree to `precision` decimal places.

use std::collections::BTreeMap;

use savor_core::{Coordinate, Semantics};

use crate::crawl::RawReview;

/// A restaurant and every review collated into it.
#[derive(Debug, Clone)]
pub struct Restaurant {
    pub id: u64,
    pub name: String,
    pub address: String,
    pub coordinate: Coordinate,
    /// Sorted by review URL.
    pub reviews: Vec<RawReview>,
    pub semantics: Semantics,
    pub closest_station_name: String,
    pub closest_station_dist: f64,
}

/// Identity of a restaurant: FNV-1a over the quantized coordinate and name.
///
/// Coordinates are rounded to `precision` decimal places and hashed as
/// little-endian `i64`, followed by the UTF-8 name bytes.
pub fn identity_hash(latitude: f64, longitude: f64, name: &str, precision: u32) -> u64 {
    let scale = 10f64.powi(precision as i32);
    let quantize = |v: f64| ((v * scale).round() as i64).to_le_bytes();

    let mut hash = fnv1a64(FNV_OFFSET, &quantize(latitude));
    hash = fnv1a64(hash, &quantize(longitude));
    fnv1a64(hash, name.as_bytes())
}

const FNV_OFFSET: u64 = 14_695_981_039_346_656_037;

fn fnv1a64(mut hash: u64, bytes: &[u8]) -> u64 {
    const PRIME: u64 = 1_099_511_628_211;
    for b in bytes {
        hash ^= u64::from(*b);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

/// Group reviews by identity hash.
///
/// The result does not depend on the order of `reviews`: each restaurant's
/// reviews are sorted by URL and its name, address, and coordinate are taken
/// from the first of them.
pub fn collate(reviews: Vec<RawReview>, precision: u32) -> BTreeMap<u64, Restaurant> {
    let mut groups: BTreeMap<u64, Vec<RawReview>> = BTreeMap::new();
    for review in reviews {
        let id = identity_hash(review.coordinate.latitude, review.coordinate.longitude, &review.name, precision);
        groups.entry(id).or_default().push(review);
    }

    groups
        .into_iter()
        .filter_map(|(id, mut reviews)| {
            reviews.sort_by(|a, b| a.url.as_str().cmp(b.url.as_str()));
            let first = reviews.first()?;
            let restaurant = Restaurant {
                id,
                name: first.name.clone(),
                address: first.address.clone(),
                coordinate: first.coordinate,
                semantics: Semantics::ZERO,
                closest_station_name: String::new(),
                closest_station_dist: 0.0,
                reviews,
            };
            Some((id, restaurant))
        })
        .collect()
}
