//! Stops-and-rests view of a timeline: every non-driving segment with a
//! map coordinate attached.
//!
//! Pickup and dropoff pin to their waypoints. Everything else is placed
//! along the active leg's polyline by the fraction of that leg's driving
//! time already consumed, falling back to full-route progress when the
//! leg carries no geometry of its own.

use crate::services::geo::point_along_geometry;
use crate::types::{DutyStatus, LngLat, Route, SegmentKind, StopOrRest, TimelineSegment};

/// Serialize the non-driving segments of `timeline` with coordinates.
pub fn build_stops_and_rests(timeline: &[TimelineSegment], route: &Route) -> Vec<StopOrRest> {
    let leg_durations_min: Vec<f64> = route
        .legs
        .iter()
        .map(|leg| leg.duration_hours * 60.0)
        .collect();
    let mut driven_leg_min = vec![0.0; leg_durations_min.len()];
    let total_driving_min: f64 = leg_durations_min.iter().sum();
    let mut cumulative_driving_min = 0.0;
    let mut active_leg = 0usize;

    let mut items = Vec::new();

    for seg in timeline {
        if seg.status == DutyStatus::Driving {
            if let SegmentKind::Drive { leg } = seg.kind {
                if !driven_leg_min.is_empty() {
                    let idx = leg.min(driven_leg_min.len() - 1);
                    active_leg = idx;
                    driven_leg_min[idx] += seg.duration_minutes;
                }
            }
            cumulative_driving_min += seg.duration_minutes;
            continue;
        }

        let coordinates = match seg.kind {
            SegmentKind::Pickup if route.waypoints.len() >= 2 => {
                active_leg = 1;
                Some(route.waypoints[1])
            }
            SegmentKind::Dropoff if route.waypoints.len() >= 3 => Some(route.waypoints[2]),
            _ => interpolate_stop(
                route,
                &leg_durations_min,
                &driven_leg_min,
                active_leg,
                total_driving_min,
                cumulative_driving_min,
            ),
        };

        items.push(StopOrRest {
            status: seg.status,
            start_time: seg.start_time,
            end_time: seg.end_time,
            duration_minutes: seg.duration_minutes,
            description: seg.description.clone(),
            coordinates,
        });
    }

    items
}

fn interpolate_stop(
    route: &Route,
    leg_durations_min: &[f64],
    driven_leg_min: &[f64],
    active_leg: usize,
    total_driving_min: f64,
    cumulative_driving_min: f64,
) -> Option<LngLat> {
    let global_progress = |driving_min: f64| -> f64 {
        if total_driving_min <= 0.0 {
            0.0
        } else {
            driving_min / total_driving_min
        }
    };

    if !route.legs.is_empty() && !driven_leg_min.is_empty() {
        let idx = active_leg.min(route.legs.len() - 1);
        let leg = &route.legs[idx];
        let leg_total = leg_durations_min.get(idx).copied().unwrap_or(0.0);

        if leg_total > 0.0 {
            let leg_progress = (driven_leg_min[idx] / leg_total).clamp(0.0, 1.0);
            if !leg.geometry.is_empty() {
                return point_along_geometry(&leg.geometry, leg_progress);
            }
            if !route.geometry.is_empty() {
                // Leg polyline missing: convert leg-local progress into
                // full-route progress before interpolating.
                let mins_before_leg: f64 = leg_durations_min[..idx].iter().sum();
                return point_along_geometry(
                    &route.geometry,
                    global_progress(mins_before_leg + driven_leg_min[idx]),
                );
            }
            return None;
        }
        if !route.geometry.is_empty() {
            return point_along_geometry(&route.geometry, global_progress(cumulative_driving_min));
        }
        return None;
    }

    if !route.geometry.is_empty() {
        return point_along_geometry(&route.geometry, global_progress(cumulative_driving_min));
    }

    None
}

// ===========================================================================
// Tests
// ===========================================================================
