//! Route provider abstraction
//!
//! Geocoding and driving directions for the three trip waypoints:
//! - MapboxProvider for production (Geocoding v5 + Directions v5)
//! - MockRouteProvider for tests and offline development
//!
//! Selection via environment / config:
//! - `MAPBOX_ACCESS_TOKEN` set → Mapbox
//! - `ROUTE_PROVIDER=mock` → mock (deterministic, no network)

mod mapbox;

pub use mapbox::MapboxProvider;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::Config;
use crate::services::geo::haversine_miles;
use crate::types::{LngLat, PlaceSuggestion, Route, RouteLeg, TripRequest};

/// Route provider trait - geocodes the three locations and returns
/// driving directions across them.
#[async_trait]
pub trait RouteProvider: Send + Sync {
    /// Resolve the trip's locations and build the route.
    /// Returns None when any address cannot be resolved or no route exists.
    async fn get_route(&self, request: &TripRequest) -> Result<Option<Route>>;

    /// Autocomplete suggestions for a location input
    async fn search_places(&self, query: &str, limit: usize) -> Result<Vec<PlaceSuggestion>>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

/// Mock provider for tests and offline development.
///
/// Geocoding hashes the location string into the continental US, routing
/// estimates road distance as haversine times a road coefficient at a
/// fixed average speed. Deterministic: same input, same route.
pub struct MockRouteProvider {
    road_coefficient: f64,
    average_speed_mph: f64,
}

impl Default for MockRouteProvider {
    fn default() -> Self {
        Self {
            road_coefficient: 1.2,
            average_speed_mph: 55.0,
        }
    }
}

impl MockRouteProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deterministic coordinates inside the continental US
    fn hash_to_coordinates(location: &str) -> LngLat {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        location.hash(&mut hasher);
        let hash = hasher.finish();

        // Inner continental-US bounds, away from the coasts
        const LAT_MIN: f64 = 31.0;
        const LAT_MAX: f64 = 46.0;
        const LNG_MIN: f64 = -115.0;
        const LNG_MAX: f64 = -78.0;

        let lat_normalized = ((hash >> 32) as f64) / (u32::MAX as f64);
        let lng_normalized = ((hash & 0xFFFF_FFFF) as f64) / (u32::MAX as f64);

        [
            LNG_MIN + lng_normalized * (LNG_MAX - LNG_MIN),
            LAT_MIN + lat_normalized * (LAT_MAX - LAT_MIN),
        ]
    }

    fn leg_between(&self, from: LngLat, to: LngLat) -> RouteLeg {
        let distance_miles = haversine_miles(from, to) * self.road_coefficient;
        RouteLeg {
            distance_miles,
            duration_hours: distance_miles / self.average_speed_mph,
            geometry: vec![from, to],
        }
    }
}

#[async_trait]
impl RouteProvider for MockRouteProvider {
    async fn get_route(&self, request: &TripRequest) -> Result<Option<Route>> {
        let current = request
            .current_location_coords
            .unwrap_or_else(|| Self::hash_to_coordinates(&request.current_location));
        let pickup = request
            .pickup_location_coords
            .unwrap_or_else(|| Self::hash_to_coordinates(&request.pickup_location));
        let dropoff = request
            .dropoff_location_coords
            .unwrap_or_else(|| Self::hash_to_coordinates(&request.dropoff_location));

        let legs = vec![
            self.leg_between(current, pickup),
            self.leg_between(pickup, dropoff),
        ];

        Ok(Some(Route {
            geometry: vec![current, pickup, dropoff],
            distance_miles: legs.iter().map(|l| l.distance_miles).sum(),
            duration_hours: legs.iter().map(|l| l.duration_hours).sum(),
            legs,
            waypoints: vec![current, pickup, dropoff],
        }))
    }

    async fn search_places(&self, query: &str, limit: usize) -> Result<Vec<PlaceSuggestion>> {
        if query.trim().is_empty() || limit == 0 {
            return Ok(vec![]);
        }
        let coords = Self::hash_to_coordinates(query);
        Ok(vec![PlaceSuggestion {
            name: format!("{}, United States", query),
            coordinates: coords.to_vec(),
        }])
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Create the route provider from configuration.
///
/// `ROUTE_PROVIDER=mock` wins; otherwise Mapbox (which resolves no routes
/// until `MAPBOX_ACCESS_TOKEN` is set).
pub fn create_route_provider(config: &Config) -> Box<dyn RouteProvider> {
    match config.route_provider.as_deref() {
        Some("mock") => {
            tracing::info!("Using mock route provider");
            Box::new(MockRouteProvider::new())
        }
        Some(other) => {
            tracing::warn!("Unknown ROUTE_PROVIDER '{}', using Mapbox", other);
            Box::new(MapboxProvider::new(config.mapbox_access_token.clone()))
        }
        None => {
            if config.mapbox_access_token.is_none() {
                tracing::warn!(
                    "MAPBOX_ACCESS_TOKEN not set; route planning will return no routes"
                );
            }
            Box::new(MapboxProvider::new(config.mapbox_access_token.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn request() -> TripRequest {
        TripRequest {
            current_location: "Chicago, IL".to_string(),
            pickup_location: "Indianapolis, IN".to_string(),
            dropoff_location: "Nashville, TN".to_string(),
            current_cycle_used_hrs: 0.0,
            start_time: DateTime::parse_from_rfc3339("2024-01-01T08:00:00Z").unwrap(),
            current_location_coords: None,
            pickup_location_coords: None,
            dropoff_location_coords: None,
        }
    }

    #[tokio::test]
    async fn mock_route_is_deterministic() {
        let provider = MockRouteProvider::new();
        let a = provider.get_route(&request()).await.unwrap().unwrap();
        let b = provider.get_route(&request()).await.unwrap().unwrap();

        assert_eq!(a.distance_miles, b.distance_miles);
        assert_eq!(a.duration_hours, b.duration_hours);
        assert_eq!(a.waypoints, b.waypoints);
    }

    #[tokio::test]
    async fn mock_route_has_two_legs_and_three_waypoints() {
        let provider = MockRouteProvider::new();
        let route = provider.get_route(&request()).await.unwrap().unwrap();

        assert_eq!(route.legs.len(), 2);
        assert_eq!(route.waypoints.len(), 3);
        assert!(route.distance_miles > 0.0);
        assert!(route.duration_hours > 0.0);
        let leg_sum: f64 = route.legs.iter().map(|l| l.duration_hours).sum();
        assert!((route.duration_hours - leg_sum).abs() < 1e-9);
    }

    #[tokio::test]
    async fn mock_respects_coordinate_overrides() {
        let mut req = request();
        req.pickup_location_coords = Some([-86.1581, 39.7684]);

        let provider = MockRouteProvider::new();
        let route = provider.get_route(&req).await.unwrap().unwrap();
        assert_eq!(route.waypoints[1], [-86.1581, 39.7684]);
    }

    #[tokio::test]
    async fn mock_coordinates_stay_inside_the_continental_us() {
        let provider = MockRouteProvider::new();
        for query in ["Chicago", "Dallas", "Denver", "Atlanta", "Portland"] {
            let suggestions = provider.search_places(query, 5).await.unwrap();
            let coords = &suggestions[0].coordinates;
            assert!(coords[1] >= 31.0 && coords[1] <= 46.0, "lat {}", coords[1]);
            assert!(coords[0] >= -115.0 && coords[0] <= -78.0, "lng {}", coords[0]);
        }
    }

    #[tokio::test]
    async fn mock_search_with_blank_query_is_empty() {
        let provider = MockRouteProvider::new();
        assert!(provider.search_places("  ", 5).await.unwrap().is_empty());
    }

    #[test]
    fn factory_selects_mock_when_configured() {
        let config = Config {
            nats_url: "nats://localhost:4222".to_string(),
            mapbox_access_token: None,
            route_provider: Some("mock".to_string()),
        };
        assert_eq!(create_route_provider(&config).name(), "mock");
    }

    #[test]
    fn factory_defaults_to_mapbox() {
        let config = Config {
            nats_url: "nats://localhost:4222".to_string(),
            mapbox_access_token: Some("pk.test".to_string()),
            route_provider: None,
        };
        assert_eq!(create_route_provider(&config).name(), "mapbox");
    }
}
