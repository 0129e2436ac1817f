//! Timeline and log-sheet types

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use super::DutyStatus;

/// What a segment is, independent of its display description.
///
/// Coordinate attachment and leg attribution key on this tag instead of
/// matching description strings. `leg` is the route-leg index the segment
/// was produced under (0 = current->pickup, 1 = pickup->dropoff).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Drive { leg: usize },
    FuelStop { leg: usize },
    Pickup,
    Dropoff,
    RestBreak,
    DailyReset,
    CycleRestart,
    SplitShortRest,
    SplitLongSleeper,
}

/// One contiguous interval of a single duty status in the full-trip
/// timeline. Segments are ordered and contiguous: each segment's end is
/// the next segment's start.
#[derive(Debug, Clone)]
pub struct TimelineSegment {
    pub status: DutyStatus,
    pub start_time: DateTime<FixedOffset>,
    pub end_time: DateTime<FixedOffset>,
    pub duration_minutes: f64,
    pub description: String,
    pub kind: SegmentKind,
}

/// One block on the 24-hour log grid. Same shape as a timeline segment
/// but never crosses local midnight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogGridSegment {
    pub status: DutyStatus,
    pub start_time: DateTime<FixedOffset>,
    pub end_time: DateTime<FixedOffset>,
    pub duration_minutes: f64,
    pub description: String,
}

/// One calendar day's log sheet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyLog {
    pub log_date: NaiveDate,
    pub from_place: String,
    pub to_place: String,
    pub segments: Vec<LogGridSegment>,
    pub total_driving_hours: f64,
    /// Driving + on-duty-not-driving
    pub total_on_duty_hours: f64,
    pub total_off_duty_hours: f64,
    pub total_sleeper_hours: f64,
}
