//! Trip planning handler
//!
//! Validates the plan-trip payload, resolves the route through the
//! provider, runs the HOS timeline engine and the day splitter, and
//! replies with route, stops-and-rests, and log sheets.

use std::sync::Arc;

use anyhow::Result;
use async_nats::{Client, Subscriber};
use chrono::{DateTime, FixedOffset, Utc};
use futures::StreamExt;
use thiserror::Error;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::services::hos::build_timeline;
use crate::services::log_sheets::build_log_sheets;
use crate::services::routing::RouteProvider;
use crate::services::stops::build_stops_and_rests;
use crate::types::{
    ErrorResponse, LngLat, PlanTripPayload, PlanTripResponse, Request, SuccessResponse,
    TripRequest,
};

const ROUTE_NOT_FOUND_MESSAGE: &str = "Could not find route. Check addresses and try again.";

/// Why a plan-trip payload was rejected
#[derive(Debug, Error, PartialEq)]
pub enum PlanRequestError {
    #[error("current_location, pickup_location, and dropoff_location are required")]
    MissingLocations,
    #[error("current_cycle_used_hrs must be between 0 and 70")]
    CycleOutOfRange,
    #[error("start_time must be an ISO datetime string")]
    BadStartTime,
    #[error("location coordinates must be [lng, lat]")]
    BadCoordinates,
}

fn parse_location_coords(value: &Option<Vec<f64>>) -> Result<Option<LngLat>, PlanRequestError> {
    match value {
        None => Ok(None),
        Some(v) if v.len() >= 2 => Ok(Some([v[0], v[1]])),
        Some(_) => Err(PlanRequestError::BadCoordinates),
    }
}

/// Validate a raw payload into a `TripRequest`. `now` supplies the
/// default start time so callers (and tests) control the clock.
pub fn validate_payload(
    payload: &PlanTripPayload,
    now: DateTime<FixedOffset>,
) -> Result<TripRequest, PlanRequestError> {
    let current_location = payload.current_location.trim();
    let pickup_location = payload.pickup_location.trim();
    let dropoff_location = payload.dropoff_location.trim();
    if current_location.is_empty() || pickup_location.is_empty() || dropoff_location.is_empty() {
        return Err(PlanRequestError::MissingLocations);
    }

    let cycle = payload.current_cycle_used_hrs;
    if !(0.0..=70.0).contains(&cycle) {
        return Err(PlanRequestError::CycleOutOfRange);
    }

    let start_time = match payload.start_time.as_deref() {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map_err(|_| PlanRequestError::BadStartTime)?,
        None => now,
    };

    Ok(TripRequest {
        current_location: current_location.to_string(),
        pickup_location: pickup_location.to_string(),
        dropoff_location: dropoff_location.to_string(),
        current_cycle_used_hrs: cycle,
        start_time,
        current_location_coords: parse_location_coords(&payload.current_location_coords)?,
        pickup_location_coords: parse_location_coords(&payload.pickup_location_coords)?,
        dropoff_location_coords: parse_location_coords(&payload.dropoff_location_coords)?,
    })
}

/// Handle trip.plan requests
pub async fn handle_plan(
    client: Client,
    mut subscriber: Subscriber,
    provider: Arc<dyn RouteProvider>,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received trip.plan message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let request: Request<PlanTripPayload> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse trip.plan request: {}", e);
                let response = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client
                    .publish(reply, serde_json::to_vec(&response)?.into())
                    .await;
                continue;
            }
        };

        let trip_request = match validate_payload(&request.payload, Utc::now().fixed_offset()) {
            Ok(r) => r,
            Err(e) => {
                let response = ErrorResponse::new(request.id, "INVALID_REQUEST", e.to_string());
                let _ = client
                    .publish(reply, serde_json::to_vec(&response)?.into())
                    .await;
                continue;
            }
        };

        let route = match provider.get_route(&trip_request).await {
            Ok(Some(route)) => route,
            Ok(None) => {
                let response =
                    ErrorResponse::new(request.id, "ROUTE_NOT_FOUND", ROUTE_NOT_FOUND_MESSAGE);
                let _ = client
                    .publish(reply, serde_json::to_vec(&response)?.into())
                    .await;
                continue;
            }
            Err(e) => {
                warn!("Route provider failed: {}", e);
                let response =
                    ErrorResponse::new(request.id, "ROUTE_NOT_FOUND", ROUTE_NOT_FOUND_MESSAGE);
                let _ = client
                    .publish(reply, serde_json::to_vec(&response)?.into())
                    .await;
                continue;
            }
        };

        let timeline = build_timeline(&trip_request, &route);
        let log_sheets = build_log_sheets(&timeline, &trip_request);
        let stops_and_rests = build_stops_and_rests(&timeline, &route);

        debug!(
            "Planned trip: {} segments, {} log sheets",
            timeline.len(),
            log_sheets.len()
        );

        let response = SuccessResponse::new(
            request.id,
            PlanTripResponse {
                route,
                stops_and_rests,
                log_sheets,
            },
        );
        let _ = client
            .publish(reply, serde_json::to_vec(&response)?.into())
            .await;
    }

    Ok(())
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<FixedOffset> {
        "2024-06-01T12:00:00+00:00".parse().unwrap()
    }

    fn payload() -> PlanTripPayload {
        PlanTripPayload {
            current_location: "Chicago, IL".to_string(),
            pickup_location: "Indianapolis, IN".to_string(),
            dropoff_location: "Nashville, TN".to_string(),
            current_cycle_used_hrs: 10.0,
            start_time: Some("2024-01-01T08:00:00Z".to_string()),
            current_location_coords: None,
            pickup_location_coords: None,
            dropoff_location_coords: None,
        }
    }

    #[test]
    fn valid_payload_passes_through() {
        let request = validate_payload(&payload(), now()).unwrap();
        assert_eq!(request.current_location, "Chicago, IL");
        assert_eq!(request.current_cycle_used_hrs, 10.0);
        assert_eq!(
            request.start_time,
            "2024-01-01T08:00:00+00:00".parse::<DateTime<FixedOffset>>().unwrap()
        );
    }

    #[test]
    fn locations_are_trimmed() {
        let mut p = payload();
        p.current_location = "  Chicago, IL  ".to_string();
        let request = validate_payload(&p, now()).unwrap();
        assert_eq!(request.current_location, "Chicago, IL");
    }

    #[test]
    fn blank_location_is_rejected() {
        let mut p = payload();
        p.pickup_location = "   ".to_string();
        assert_eq!(
            validate_payload(&p, now()),
            Err(PlanRequestError::MissingLocations)
        );
    }

    #[test]
    fn missing_location_field_is_rejected() {
        // A payload without the field deserializes to an empty string.
        let p: PlanTripPayload = serde_json::from_str(
            r#"{"current_location": "A", "pickup_location": "B", "current_cycle_used_hrs": 0}"#,
        )
        .unwrap();
        assert_eq!(
            validate_payload(&p, now()),
            Err(PlanRequestError::MissingLocations)
        );
    }

    #[test]
    fn cycle_out_of_range_is_rejected() {
        let mut p = payload();
        p.current_cycle_used_hrs = -1.0;
        assert_eq!(
            validate_payload(&p, now()),
            Err(PlanRequestError::CycleOutOfRange)
        );

        p.current_cycle_used_hrs = 70.5;
        assert_eq!(
            validate_payload(&p, now()),
            Err(PlanRequestError::CycleOutOfRange)
        );

        p.current_cycle_used_hrs = 70.0;
        assert!(validate_payload(&p, now()).is_ok());
    }

    #[test]
    fn non_numeric_cycle_fails_at_deserialization() {
        let result: Result<PlanTripPayload, _> = serde_json::from_str(
            r#"{"current_location": "A", "pickup_location": "B",
                "dropoff_location": "C", "current_cycle_used_hrs": "lots"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn unparseable_start_time_is_rejected() {
        let mut p = payload();
        p.start_time = Some("yesterday at noon".to_string());
        assert_eq!(
            validate_payload(&p, now()),
            Err(PlanRequestError::BadStartTime)
        );
    }

    #[test]
    fn absent_start_time_defaults_to_now() {
        let mut p = payload();
        p.start_time = None;
        let request = validate_payload(&p, now()).unwrap();
        assert_eq!(request.start_time, now());
    }

    #[test]
    fn start_time_offset_is_preserved() {
        let mut p = payload();
        p.start_time = Some("2024-01-01T08:00:00-06:00".to_string());
        let request = validate_payload(&p, now()).unwrap();
        assert_eq!(request.start_time.offset().local_minus_utc(), -6 * 3600);
    }

    #[test]
    fn short_coordinate_pair_is_rejected() {
        let mut p = payload();
        p.pickup_location_coords = Some(vec![-86.1581]);
        assert_eq!(
            validate_payload(&p, now()),
            Err(PlanRequestError::BadCoordinates)
        );
    }

    #[test]
    fn coordinate_overrides_pass_through() {
        let mut p = payload();
        p.dropoff_location_coords = Some(vec![-86.7816, 36.1627]);
        let request = validate_payload(&p, now()).unwrap();
        assert_eq!(request.dropoff_location_coords, Some([-86.7816, 36.1627]));
    }

    #[test]
    fn error_messages_match_the_api_contract() {
        assert_eq!(
            PlanRequestError::MissingLocations.to_string(),
            "current_location, pickup_location, and dropoff_location are required"
        );
        assert_eq!(
            PlanRequestError::CycleOutOfRange.to_string(),
            "current_cycle_used_hrs must be between 0 and 70"
        );
        assert_eq!(
            PlanRequestError::BadStartTime.to_string(),
            "start_time must be an ISO datetime string"
        );
        assert_eq!(
            PlanRequestError::BadCoordinates.to_string(),
            "location coordinates must be [lng, lat]"
        );
    }

    // Full pipeline against the mock provider: the same wiring the
    // handler runs per message, minus the transport.
    #[tokio::test]
    async fn plan_pipeline_produces_consistent_response() {
        use crate::services::routing::{MockRouteProvider, RouteProvider};
        use crate::types::DutyStatus;

        let request = validate_payload(&payload(), now()).unwrap();
        let provider = MockRouteProvider::new();
        let route = provider.get_route(&request).await.unwrap().unwrap();

        let timeline = build_timeline(&request, &route);
        let log_sheets = build_log_sheets(&timeline, &request);
        let stops_and_rests = build_stops_and_rests(&timeline, &route);

        assert!(!timeline.is_empty());
        assert!(!log_sheets.is_empty());
        // Stops exclude driving segments.
        assert!(stops_and_rests
            .iter()
            .all(|s| s.status != DutyStatus::Driving));
        let non_driving = timeline
            .iter()
            .filter(|s| s.status != DutyStatus::Driving)
            .count();
        assert_eq!(stops_and_rests.len(), non_driving);

        // Every log-sheet day stays within 24 hours.
        for sheet in &log_sheets {
            let sum = sheet.total_on_duty_hours
                + sheet.total_off_duty_hours
                + sheet.total_sleeper_hours;
            assert!(sum <= 24.0 + 0.01);
        }
    }
}
