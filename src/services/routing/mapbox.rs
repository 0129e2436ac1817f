//! Mapbox geocoding and directions client
//!
//! Geocoding v5: https://docs.mapbox.com/api/search/geocoding/
//! Directions v5: https://docs.mapbox.com/api/navigation/directions/

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::RouteProvider;
use crate::types::{LngLat, PlaceSuggestion, Route, RouteLeg, TripRequest};

const GEOCODE_URL: &str = "https://api.mapbox.com/geocoding/v5/mapbox.places";
const DIRECTIONS_URL: &str = "https://api.mapbox.com/directions/v5/mapbox/driving";

const METERS_TO_MILES: f64 = 0.000621371;
const SECONDS_TO_HOURS: f64 = 1.0 / 3600.0;

/// Mapbox route provider
pub struct MapboxProvider {
    client: reqwest::Client,
    access_token: Option<String>,
}

impl MapboxProvider {
    pub fn new(access_token: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            access_token,
        }
    }

    fn token(&self) -> Option<&str> {
        self.access_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Geocode one location string to [lng, lat], US-restricted.
    /// Returns None when Mapbox has no match.
    async fn geocode(&self, token: &str, query: &str) -> Result<Option<LngLat>> {
        let url = format!("{}/{}.json", GEOCODE_URL, urlencoding::encode(query));

        let response = self
            .client
            .get(&url)
            .query(&[
                ("access_token", token),
                ("limit", "1"),
                ("country", "us"),
            ])
            .send()
            .await
            .context("Failed to send geocoding request")?;

        if !response.status().is_success() {
            let status = response.status();
            anyhow::bail!("Mapbox geocoding returned error {}", status);
        }

        let doc: GeocodeResponse = response
            .json()
            .await
            .context("Failed to parse geocoding response")?;

        Ok(doc
            .features
            .into_iter()
            .next()
            .and_then(|f| f.center)
            .and_then(lng_lat_pair))
    }
}

#[async_trait]
impl RouteProvider for MapboxProvider {
    async fn get_route(&self, request: &TripRequest) -> Result<Option<Route>> {
        let token = match self.token() {
            Some(t) => t.to_string(),
            None => return Ok(None),
        };

        let current = match request.current_location_coords {
            Some(c) => Some(c),
            None => self.geocode(&token, &request.current_location).await?,
        };
        let pickup = match request.pickup_location_coords {
            Some(c) => Some(c),
            None => self.geocode(&token, &request.pickup_location).await?,
        };
        let dropoff = match request.dropoff_location_coords {
            Some(c) => Some(c),
            None => self.geocode(&token, &request.dropoff_location).await?,
        };

        let (current, pickup, dropoff) = match (current, pickup, dropoff) {
            (Some(a), Some(b), Some(c)) => (a, b, c),
            _ => return Ok(None),
        };

        let url = format!(
            "{}/{}",
            DIRECTIONS_URL,
            coords_to_path(&[current, pickup, dropoff])
        );
        debug!("Requesting directions for 3 waypoints");

        let response = self
            .client
            .get(&url)
            .query(&[("access_token", token.as_str()), ("geometries", "geojson")])
            .send()
            .await
            .context("Failed to send directions request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Mapbox directions returned error {}: {}", status, body);
        }

        let doc: DirectionsResponse = response
            .json()
            .await
            .context("Failed to parse directions response")?;

        Ok(route_from_directions(doc, [current, pickup, dropoff]))
    }

    async fn search_places(&self, query: &str, limit: usize) -> Result<Vec<PlaceSuggestion>> {
        let token = match self.token() {
            Some(t) => t.to_string(),
            None => return Ok(vec![]),
        };
        if query.trim().is_empty() {
            return Ok(vec![]);
        }

        let url = format!("{}/{}.json", GEOCODE_URL, urlencoding::encode(query));
        let limit = limit.clamp(1, 10).to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("access_token", token.as_str()),
                ("limit", limit.as_str()),
                ("autocomplete", "true"),
                ("types", "place,address,postcode"),
                ("country", "us"),
            ])
            .send()
            .await
            .context("Failed to send place search request")?;

        if !response.status().is_success() {
            let status = response.status();
            anyhow::bail!("Mapbox place search returned error {}", status);
        }

        let doc: GeocodeResponse = response
            .json()
            .await
            .context("Failed to parse place search response")?;

        Ok(doc
            .features
            .into_iter()
            .filter_map(|feature| {
                let coordinates = feature.center.clone()?;
                Some(PlaceSuggestion {
                    name: feature
                        .place_name
                        .or(feature.text)
                        .unwrap_or_default(),
                    coordinates,
                })
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "mapbox"
    }
}

/// Format waypoints for the Directions path: "lng,lat;lng,lat;..."
fn coords_to_path(coords: &[LngLat]) -> String {
    coords
        .iter()
        .map(|c| format!("{},{}", c[0], c[1]))
        .collect::<Vec<_>>()
        .join(";")
}

fn lng_lat_pair(center: Vec<f64>) -> Option<LngLat> {
    if center.len() < 2 {
        return None;
    }
    Some([center[0], center[1]])
}

/// Convert the first Mapbox route into our shape, meters to miles and
/// seconds to hours.
fn route_from_directions(doc: DirectionsResponse, waypoints: [LngLat; 3]) -> Option<Route> {
    let route = doc.routes.into_iter().next()?;

    let legs = route
        .legs
        .into_iter()
        .map(|leg| RouteLeg {
            distance_miles: leg.distance * METERS_TO_MILES,
            duration_hours: leg.duration * SECONDS_TO_HOURS,
            geometry: leg.geometry.map(|g| g.coordinates).unwrap_or_default(),
        })
        .collect();

    Some(Route {
        geometry: route.geometry.map(|g| g.coordinates).unwrap_or_default(),
        distance_miles: route.distance * METERS_TO_MILES,
        duration_hours: route.duration * SECONDS_TO_HOURS,
        legs,
        waypoints: waypoints.to_vec(),
    })
}

// Mapbox API types

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    features: Vec<GeocodeFeature>,
}

#[derive(Debug, Deserialize)]
struct GeocodeFeature {
    #[serde(default)]
    center: Option<Vec<f64>>,
    #[serde(default)]
    place_name: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
    #[serde(default)]
    geometry: Option<GeoJsonGeometry>,
    #[serde(default)]
    legs: Vec<DirectionsLeg>,
}

#[derive(Debug, Deserialize)]
struct DirectionsLeg {
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
    /// Absent from the default Directions payload; kept optional
    #[serde(default)]
    geometry: Option<GeoJsonGeometry>,
}

#[derive(Debug, Deserialize)]
struct GeoJsonGeometry {
    #[serde(default)]
    coordinates: Vec<LngLat>,
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

    #[test]
    fn coords_to_path_joins_with_semicolons() {
        let path = coords_to_path(&[[-87.6, 41.9], [-86.2, 39.8]]);
        assert_eq!(path, "-87.6,41.9;-86.2,39.8");
    }

    #[test]
    fn directions_response_converts_units() {
        let json = r#"{
            "routes": [{
                "distance": 160934.4,
                "duration": 7200.0,
                "geometry": {"coordinates": [[-87.6, 41.9], [-86.2, 39.8]]},
                "legs": [
                    {"distance": 80467.2, "duration": 3600.0},
                    {"distance": 80467.2, "duration": 3600.0}
                ]
            }]
        }"#;
        let doc: DirectionsResponse = serde_json::from_str(json).unwrap();
        let waypoints = [[-87.6, 41.9], [-86.9, 40.8], [-86.2, 39.8]];

        let route = route_from_directions(doc, waypoints).unwrap();

        assert!((route.distance_miles - 100.0).abs() < 0.01);
        assert!((route.duration_hours - 2.0).abs() < 1e-9);
        assert_eq!(route.legs.len(), 2);
        assert!((route.legs[0].distance_miles - 50.0).abs() < 0.01);
        assert!((route.legs[0].duration_hours - 1.0).abs() < 1e-9);
        // Leg geometry is absent from the default Directions payload.
        assert!(route.legs[0].geometry.is_empty());
        assert_eq!(route.geometry.len(), 2);
        assert_eq!(route.waypoints.len(), 3);
    }

    #[test]
    fn empty_routes_array_yields_no_route() {
        let doc: DirectionsResponse = serde_json::from_str(r#"{"routes": []}"#).unwrap();
        assert!(route_from_directions(doc, [[0.0, 0.0]; 3]).is_none());
    }

    #[test]
    fn geocode_feature_without_center_is_skipped() {
        assert_eq!(lng_lat_pair(vec![]), None);
        assert_eq!(lng_lat_pair(vec![1.0]), None);
        assert_eq!(lng_lat_pair(vec![-87.6, 41.9]), Some([-87.6, 41.9]));
    }

    #[test]
    fn missing_token_resolves_no_route() {
        let provider = MapboxProvider::new(None);
        let route = tokio_test::block_on(provider.get_route(&request())).unwrap();
        assert!(route.is_none());
    }

    #[test]
    fn blank_token_counts_as_missing() {
        let provider = MapboxProvider::new(Some("   ".to_string()));
        let route = tokio_test::block_on(provider.get_route(&request())).unwrap();
        assert!(route.is_none());

        let suggestions =
            tokio_test::block_on(provider.search_places("Chic", 5)).unwrap();
        assert!(suggestions.is_empty());
    }

    #[tokio::test]
    #[ignore = "Requires a Mapbox access token and network access"]
    async fn mapbox_integration_chicago_nashville() {
        let token = std::env::var("MAPBOX_ACCESS_TOKEN").unwrap();
        let provider = MapboxProvider::new(Some(token));

        let route = provider.get_route(&request()).await.unwrap().unwrap();
        assert_eq!(route.legs.len(), 2);
        // Chicago -> Indianapolis -> Nashville is roughly 470 road miles.
        assert!(route.distance_miles > 400.0 && route.distance_miles < 600.0);
    }
}
