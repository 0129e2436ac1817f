//! Wire payloads for the trip-planning and autocomplete subjects

use serde::{Deserialize, Serialize};

use super::{DailyLog, DutyStatus, LngLat, PlaceSuggestion, Route};
use chrono::{DateTime, FixedOffset};

/// Raw plan-trip payload as received on the wire, before validation.
///
/// The three locations default to empty strings so that a missing field
/// and a blank field produce the same "required" validation error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanTripPayload {
    #[serde(default)]
    pub current_location: String,
    #[serde(default)]
    pub pickup_location: String,
    #[serde(default)]
    pub dropoff_location: String,
    #[serde(default)]
    pub current_cycle_used_hrs: f64,
    /// ISO-8601 datetime; defaults to now when absent
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub current_location_coords: Option<Vec<f64>>,
    #[serde(default)]
    pub pickup_location_coords: Option<Vec<f64>>,
    #[serde(default)]
    pub dropoff_location_coords: Option<Vec<f64>>,
}

/// A non-driving timeline segment with its map coordinate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopOrRest {
    pub status: DutyStatus,
    pub start_time: DateTime<FixedOffset>,
    pub end_time: DateTime<FixedOffset>,
    pub duration_minutes: f64,
    pub description: String,
    pub coordinates: Option<LngLat>,
}

/// Full plan-trip response payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanTripResponse {
    pub route: Route,
    pub stops_and_rests: Vec<StopOrRest>,
    pub log_sheets: Vec<DailyLog>,
}

/// Autocomplete query payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceQueryPayload {
    #[serde(default)]
    pub q: String,
}

/// Autocomplete response payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceSuggestionsResponse {
    pub suggestions: Vec<PlaceSuggestion>,
}
