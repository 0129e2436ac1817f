//! Trip planning request

use chrono::{DateTime, FixedOffset};

use super::LngLat;

/// Validated input for one planning operation.
///
/// `start_time` carries the timezone offset used for every segment
/// timestamp and for the midnight boundaries of the log sheets.
#[derive(Debug, Clone, PartialEq)]
pub struct TripRequest {
    pub current_location: String,
    pub pickup_location: String,
    pub dropoff_location: String,
    /// Hours already consumed against the 70-hour/8-day window, [0, 70]
    pub current_cycle_used_hrs: f64,
    pub start_time: DateTime<FixedOffset>,
    /// Pre-resolved coordinates bypass geocoding
    pub current_location_coords: Option<LngLat>,
    pub pickup_location_coords: Option<LngLat>,
    pub dropoff_location_coords: Option<LngLat>,
}
