//! Semantic and station aggregation over collated restaurants.

use std::collections::BTreeMap;

use savor_core::{RestaurantRow, Semantics, StationIndex};

use crate::collate::Restaurant;

/// Weighted average of the review features, projected onto the four axes.
///
/// Each category value contributes `define(category) * value * weight`, where
/// `weight` is the review count of its review. The sum is divided by the
/// total weight; a restaurant whose reviews have zero total weight keeps the
/// zero vector.
pub fn compute_semantics(restaurants: &mut BTreeMap<u64, Restaurant>) {
    for restaurant in restaurants.values_mut() {
        let mut sum = Semantics::ZERO;
        let mut total = 0.0;

        for review in &restaurant.reviews {
            for (category, value) in &review.features {
                sum = sum.combine(review.adapter.define(category), review.weight * value);
            }
            total += review.weight;
        }

        restaurant.semantics = if total > 0.0 { sum.reduce(total) } else { Semantics::ZERO };
    }
}

/// Attach the nearest station to every restaurant.
///
/// With an empty station index the name stays empty and the distance zero.
pub fn compute_stations(restaurants: &mut BTreeMap<u64, Restaurant>, stations: &StationIndex) {
    if stations.is_empty() {
        tracing::warn!("station index is empty; restaurants get no closest station");
    }

    for restaurant in restaurants.values_mut() {
        if let Some((station, distance)) = stations.closest(restaurant.coordinate) {
            restaurant.closest_station_name = station.name.clone();
            restaurant.closest_station_dist = distance;
        }
    }
}

/// Flatten restaurants into dataset rows.
pub fn to_rows(restaurants: &BTreeMap<u64, Restaurant>) -> Vec<RestaurantRow> {
    restaurants
        .values()
        .map(|r| RestaurantRow {
            id: r.id,
            name: r.name.clone(),
            address: r.address.clone(),
            urls: r.reviews.iter().map(|v| v.url.as_str()).collect::<Vec<_>>().join(","),
            semantics: r.semantics,
            coordinate: r.coordinate,
            closest_station_name: r.closest_station_name.clone(),
            closest_station_dist: r.closest_station_dist,
            access_count: 0,
        })
        .collect()
}
