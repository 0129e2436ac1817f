//! Route types returned by the directions provider

use serde::{Deserialize, Serialize};

/// A `[longitude, latitude]` pair (GeoJSON coordinate order)
pub type LngLat = [f64; 2];

/// One leg of the route (current -> pickup, pickup -> dropoff)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteLeg {
    pub distance_miles: f64,
    pub duration_hours: f64,
    /// Coarse polyline for this leg, [lng, lat] pairs
    #[serde(default)]
    pub geometry: Vec<LngLat>,
}

/// Full driving route across the three waypoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    /// Full-route polyline, [lng, lat] pairs (may be empty when leg
    /// geometries are present)
    #[serde(default)]
    pub geometry: Vec<LngLat>,
    pub distance_miles: f64,
    pub duration_hours: f64,
    #[serde(default)]
    pub legs: Vec<RouteLeg>,
    /// Waypoint coordinates for map markers: [current, pickup, dropoff]
    #[serde(default)]
    pub waypoints: Vec<LngLat>,
}

/// Autocomplete suggestion for a location input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceSuggestion {
    pub name: String,
    pub coordinates: Vec<f64>,
}
