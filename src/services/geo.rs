//! Geometric helpers for placing stops on the route polyline.
//!
//! Interpolation is planar Euclidean on raw [lng, lat] pairs — distorted
//! at continental scale, but the points are only used as map markers.

use crate::types::LngLat;

/// Earth radius in miles
const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Haversine distance between two [lng, lat] points in miles
pub fn haversine_miles(from: LngLat, to: LngLat) -> f64 {
    let d_lat = (to[1] - from[1]).to_radians();
    let d_lng = (to[0] - from[0]).to_radians();

    let lat1 = from[1].to_radians();
    let lat2 = to[1].to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_MILES * c
}

/// Return the [lng, lat] point a fractional `progress` (0..1) along the
/// polyline, measured by cumulative segment length. None for an empty
/// polyline.
pub fn point_along_geometry(geometry: &[LngLat], progress: f64) -> Option<LngLat> {
    if geometry.is_empty() {
        return None;
    }
    if geometry.len() == 1 {
        return Some(geometry[0]);
    }

    let progress = progress.clamp(0.0, 1.0);

    let mut segment_lengths = Vec::with_capacity(geometry.len() - 1);
    let mut total_length = 0.0;
    for pair in geometry.windows(2) {
        let [x0, y0] = pair[0];
        let [x1, y1] = pair[1];
        let seg_len = (x1 - x0).hypot(y1 - y0);
        segment_lengths.push(seg_len);
        total_length += seg_len;
    }

    if total_length <= 0.0 {
        return geometry.last().copied();
    }

    let target = total_length * progress;
    let mut walked = 0.0;
    for (i, seg_len) in segment_lengths.iter().enumerate() {
        let next_walked = walked + seg_len;
        if next_walked >= target {
            if *seg_len <= 0.0 {
                return Some(geometry[i + 1]);
            }
            let t = (target - walked) / seg_len;
            let [x0, y0] = geometry[i];
            let [x1, y1] = geometry[i + 1];
            return Some([x0 + (x1 - x0) * t, y0 + (y1 - y0) * t]);
        }
        walked = next_walked;
    }

    geometry.last().copied()
}
