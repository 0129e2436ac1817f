//! Day splitter: turn a trip timeline into per-calendar-day log sheets.
//!
//! Segments that cross local midnight are cut at the boundary so every
//! grid segment fits a single 24-hour ELD sheet. Midnight is evaluated in
//! the timezone offset of the trip's start time; mid-trip timezone
//! transitions are not modelled.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime, Offset, TimeZone};

use crate::types::{DailyLog, DutyStatus, LogGridSegment, TimelineSegment, TripRequest};

fn round2(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0
}

/// Cut one timeline segment at every local midnight it crosses.
/// Fragment durations sum to the parent duration to the minute.
fn split_segment_by_day(seg: &TimelineSegment) -> Vec<(NaiveDate, LogGridSegment)> {
    let offset = seg.start_time.offset().fix();
    let end = seg.end_time;

    let mut out = Vec::new();
    let mut current_start = seg.start_time;
    while current_start < end {
        let date = current_start.date_naive();
        let next_midnight = date
            .succ_opt()
            .map(|d| d.and_time(NaiveTime::MIN))
            .and_then(|naive| offset.from_local_datetime(&naive).single());
        let segment_end = match next_midnight {
            Some(midnight) if midnight < end => midnight,
            _ => end,
        };

        let chunk_min = (segment_end - current_start).num_milliseconds() as f64 / 60_000.0;
        if chunk_min <= 0.0 {
            break;
        }

        out.push((
            date,
            LogGridSegment {
                status: seg.status,
                start_time: current_start,
                end_time: segment_end,
                duration_minutes: chunk_min,
                description: seg.description.clone(),
            },
        ));
        current_start = segment_end;
    }

    out
}

fn totals_for_segments(segments: &[LogGridSegment]) -> (f64, f64, f64, f64) {
    let mut driving = 0.0;
    let mut on_duty_nd = 0.0;
    let mut off_duty = 0.0;
    let mut sleeper = 0.0;
    for s in segments {
        let hrs = s.duration_minutes / 60.0;
        match s.status {
            DutyStatus::Driving => driving += hrs,
            DutyStatus::OnDutyNotDriving => on_duty_nd += hrs,
            DutyStatus::OffDuty => off_duty += hrs,
            DutyStatus::SleeperBerth => sleeper += hrs,
        }
    }
    (driving, on_duty_nd, off_duty, sleeper)
}

/// Group the timeline by calendar day and build one log sheet per day,
/// dates ascending. An empty timeline yields no sheets.
///
/// From/to labelling is deliberately coarse: the first day is labelled
/// current -> pickup and every later day pickup -> dropoff, whether or
/// not the pickup actually happened that day.
pub fn build_log_sheets(timeline: &[TimelineSegment], request: &TripRequest) -> Vec<DailyLog> {
    let mut by_day: BTreeMap<NaiveDate, Vec<LogGridSegment>> = BTreeMap::new();

    for seg in timeline {
        for (date, grid_seg) in split_segment_by_day(seg) {
            by_day.entry(date).or_default().push(grid_seg);
        }
    }

    by_day
        .into_iter()
        .enumerate()
        .map(|(i, (log_date, mut segments))| {
            segments.sort_by_key(|s| s.start_time);
            let (driving, on_duty_nd, off_duty, sleeper) = totals_for_segments(&segments);

            let (from_place, to_place) = if i == 0 {
                (
                    request.current_location.clone(),
                    request.pickup_location.clone(),
                )
            } else {
                (
                    request.pickup_location.clone(),
                    request.dropoff_location.clone(),
                )
            };

            DailyLog {
                log_date,
                from_place,
                to_place,
                segments,
                total_driving_hours: round2(driving),
                total_on_duty_hours: round2(driving + on_duty_nd),
                total_off_duty_hours: round2(off_duty),
                total_sleeper_hours: round2(sleeper),
            }
        })
        .collect()
}

// ===========================================================================
// Tests
// ===========================================================================
