//! HOS timeline engine.
//!
//! Walks a route and emits an ordered, contiguous list of duty segments
//! under the federal Hours-of-Service limits: 11 hr driving, 14 hr on-duty
//! window, 30 min break after 8 hr driving, 10 hr daily reset, the
//! split-sleeper pair, and the 70 hr / 8 day cycle with 34 hr restart.
//! Fuel stops are inserted every 1000 miles inside a leg; pickup and
//! dropoff each add one hour of on-duty work.
//!
//! The engine is pure: no I/O, no clock reads, identical output for
//! identical input.

use chrono::Duration;

use crate::types::{
    DutyStatus, Route, RouteLeg, SegmentKind, TimelineSegment, TripRequest,
};

pub const DRIVE_LIMIT_MIN: f64 = 11.0 * 60.0;
pub const WINDOW_LIMIT_MIN: f64 = 14.0 * 60.0;
pub const BREAK_AFTER_DRIVE_MIN: f64 = 8.0 * 60.0;
pub const BREAK_DURATION_MIN: f64 = 30.0;
pub const REST_DURATION_MIN: f64 = 10.0 * 60.0;
pub const RESTART_DURATION_MIN: f64 = 34.0 * 60.0;
pub const CYCLE_LIMIT_MIN: f64 = 70.0 * 60.0;
pub const PICKUP_DROPOFF_MIN: f64 = 60.0;
pub const FUEL_INTERVAL_MILES: f64 = 1000.0;
pub const FUEL_STOP_MIN: f64 = 30.0;
pub const SPLIT_SHORT_REST_MIN: f64 = 2.0 * 60.0;
pub const SPLIT_LONG_SLEEPER_MIN: f64 = 7.0 * 60.0;

/// Horizon over which unknown pre-trip cycle hours are amortized out
const CYCLE_HORIZON_MIN: f64 = 8.0 * 24.0 * 60.0;

/// Running HOS counters. All durations are in minutes.
#[derive(Debug, Clone)]
pub struct HosState {
    /// Wall-clock time at which the next segment begins
    pub current: chrono::DateTime<chrono::FixedOffset>,
    /// Minutes driven since the last 10-hour reset (or trip start)
    pub drive_since_reset: f64,
    /// Minutes of the 14-hour window consumed since the last reset
    pub window_since_reset: f64,
    /// Minutes driven since the last qualifying (>= 30 min) break
    pub driving_since_break: f64,
    /// Length of the current contiguous non-driving stretch
    pub non_driving_streak: f64,
    /// Minutes counting toward the 70-hour / 8-day cycle
    pub rolling_cycle_min: f64,
    /// Amortization rate for pre-trip cycle hours
    pub cycle_decay_per_min: f64,
    /// 0 = no split in progress, 1 = 2-hour short break taken,
    /// waiting for the 7-hour sleeper half
    pub split_stage: u8,
}

impl HosState {
    /// State at engine entry. The request does not say *when* the pre-trip
    /// cycle hours were consumed, so they are amortized linearly over the
    /// full 8-day horizon.
    fn at_trip_start(request: &TripRequest) -> Self {
        let initial_cycle_min = (request.current_cycle_used_hrs * 60.0).max(0.0);
        let cycle_decay_per_min = if initial_cycle_min > 0.0 {
            initial_cycle_min / CYCLE_HORIZON_MIN
        } else {
            0.0
        };

        Self {
            current: request.start_time,
            drive_since_reset: 0.0,
            window_since_reset: 0.0,
            driving_since_break: 0.0,
            non_driving_streak: 0.0,
            rolling_cycle_min: initial_cycle_min,
            cycle_decay_per_min,
            split_stage: 0,
        }
    }
}

fn minutes(min: f64) -> Duration {
    Duration::milliseconds((min * 60_000.0).round() as i64)
}

/// Segment accumulator plus the counter block it advances.
struct TimelinePlanner {
    state: HosState,
    segments: Vec<TimelineSegment>,
}

impl TimelinePlanner {
    fn new(request: &TripRequest) -> Self {
        Self {
            state: HosState::at_trip_start(request),
            segments: Vec::new(),
        }
    }

    /// Decay the rolling cycle for the elapsed minutes, then add the
    /// on-duty portion. Decay applies to all elapsed time, on-duty or not.
    fn advance_cycle(&mut self, elapsed_min: f64, on_duty_add_min: f64) {
        if elapsed_min > 0.0 && self.state.cycle_decay_per_min > 0.0 {
            self.state.rolling_cycle_min = (self.state.rolling_cycle_min
                - self.state.cycle_decay_per_min * elapsed_min)
                .max(0.0);
        }
        self.state.rolling_cycle_min += on_duty_add_min.max(0.0);
    }

    /// Append one segment and advance every counter.
    ///
    /// `count_toward_window` distinguishes off-duty interruptions that
    /// pause the 14-hour window (resets, split halves) from ones that
    /// consume it (the 30-minute break, fuel stops, pickup/dropoff).
    fn push_segment(
        &mut self,
        kind: SegmentKind,
        status: DutyStatus,
        duration_min: f64,
        description: &str,
        count_toward_window: bool,
    ) {
        let start = self.state.current;
        let end = start + minutes(duration_min);
        self.segments.push(TimelineSegment {
            status,
            start_time: start,
            end_time: end,
            duration_minutes: duration_min,
            description: description.to_string(),
            kind,
        });

        let on_duty_add = if status.is_on_duty() { duration_min } else { 0.0 };
        self.advance_cycle(duration_min, on_duty_add);

        if status == DutyStatus::Driving {
            self.state.drive_since_reset += duration_min;
            self.state.window_since_reset += duration_min;
            self.state.driving_since_break += duration_min;
            self.state.non_driving_streak = 0.0;
        } else {
            if count_toward_window {
                self.state.window_since_reset += duration_min;
            }
            self.state.non_driving_streak += duration_min;
            if self.state.non_driving_streak >= BREAK_DURATION_MIN {
                self.state.driving_since_break = 0.0;
            }
        }

        self.state.current = end;
    }

    fn insert_daily_reset(&mut self, reason: &str) {
        self.push_segment(
            SegmentKind::DailyReset,
            DutyStatus::SleeperBerth,
            REST_DURATION_MIN,
            reason,
            false,
        );
        self.state.drive_since_reset = 0.0;
        self.state.window_since_reset = 0.0;
        self.state.driving_since_break = 0.0;
        self.state.non_driving_streak = REST_DURATION_MIN;
        self.state.split_stage = 0;
    }

    fn insert_cycle_restart(&mut self) {
        self.push_segment(
            SegmentKind::CycleRestart,
            DutyStatus::SleeperBerth,
            RESTART_DURATION_MIN,
            "34-hour restart",
            false,
        );
        self.state.drive_since_reset = 0.0;
        self.state.window_since_reset = 0.0;
        self.state.driving_since_break = 0.0;
        self.state.non_driving_streak = RESTART_DURATION_MIN;
        self.state.rolling_cycle_min = 0.0;
        self.state.split_stage = 0;
    }

    fn insert_split_short(&mut self) {
        self.push_segment(
            SegmentKind::SplitShortRest,
            DutyStatus::OffDuty,
            SPLIT_SHORT_REST_MIN,
            "Split sleeper break (2 hr off duty)",
            false,
        );
        self.state.split_stage = 1;
    }

    fn insert_split_long(&mut self) {
        self.push_segment(
            SegmentKind::SplitLongSleeper,
            DutyStatus::SleeperBerth,
            SPLIT_LONG_SLEEPER_MIN,
            "Split sleeper berth (7 hr)",
            false,
        );
        // A completed split pair is excluded from the 14-hour window.
        self.state.window_since_reset = (self.state.window_since_reset
            - (SPLIT_SHORT_REST_MIN + SPLIT_LONG_SLEEPER_MIN))
            .max(0.0);
        self.state.split_stage = 0;
    }

    /// Insert 34-hour restarts until `required_min` of on-duty time fits
    /// under the cycle limit. Runs before every fuel stop, pickup, and
    /// dropoff.
    fn ensure_cycle_capacity(&mut self, required_min: f64) {
        while self.state.rolling_cycle_min + required_min > CYCLE_LIMIT_MIN {
            self.insert_cycle_restart();
        }
    }

    /// Append `drive_min_total` minutes of driving, interrupted by
    /// whatever rest the limits require. Conditions are checked in fixed
    /// priority order: cycle, 30-minute break, 11-hour drive limit,
    /// 14-hour window.
    fn drive_with_hos(&mut self, leg: usize, drive_min_total: f64, description: &str) {
        let mut remaining_drive = drive_min_total;

        while remaining_drive > 0.0 {
            if self.state.rolling_cycle_min >= CYCLE_LIMIT_MIN {
                self.insert_cycle_restart();
                continue;
            }

            if self.state.driving_since_break >= BREAK_AFTER_DRIVE_MIN {
                self.push_segment(
                    SegmentKind::RestBreak,
                    DutyStatus::OffDuty,
                    BREAK_DURATION_MIN,
                    "30-minute break",
                    true,
                );
                continue;
            }

            if self.state.drive_since_reset >= DRIVE_LIMIT_MIN {
                self.insert_daily_reset("10-hour rest (11hr drive limit)");
                continue;
            }

            if self.state.window_since_reset >= WINDOW_LIMIT_MIN {
                // Window exhaustion tries a split-sleeper pair first.
                if self.state.split_stage == 0 {
                    self.insert_split_short();
                    continue;
                }
                self.insert_split_long();
                if self.state.window_since_reset >= WINDOW_LIMIT_MIN {
                    self.insert_daily_reset("10-hour rest (14hr window)");
                }
                continue;
            }

            let window_left = WINDOW_LIMIT_MIN - self.state.window_since_reset;
            let drive_left = DRIVE_LIMIT_MIN - self.state.drive_since_reset;
            let mut break_left = BREAK_AFTER_DRIVE_MIN - self.state.driving_since_break;
            if break_left <= 0.0 {
                break_left = BREAK_AFTER_DRIVE_MIN;
            }

            let chunk = remaining_drive.min(window_left).min(drive_left).min(break_left);
            if chunk <= 0.0 {
                continue;
            }

            self.push_segment(
                SegmentKind::Drive { leg },
                DutyStatus::Driving,
                chunk,
                description,
                true,
            );
            remaining_drive -= chunk;
        }
    }

    /// Drive one leg, splitting it into fuel intervals. A 30-minute fuel
    /// stop follows every full interval except the last; a leg with zero
    /// duration produces neither driving segments nor fuel stops.
    fn drive_leg(&mut self, leg_idx: usize, leg: &RouteLeg, description: &str) {
        let sub_segments = split_leg_by_fuel(leg.distance_miles, leg.duration_hours);
        let last = sub_segments.len() - 1;
        for (i, (seg_miles, seg_hours)) in sub_segments.iter().enumerate() {
            self.drive_with_hos(leg_idx, seg_hours * 60.0, description);
            if i < last && *seg_miles >= FUEL_INTERVAL_MILES && *seg_hours > 0.0 {
                self.ensure_cycle_capacity(FUEL_STOP_MIN);
                self.push_segment(
                    SegmentKind::FuelStop { leg: leg_idx },
                    DutyStatus::OnDutyNotDriving,
                    FUEL_STOP_MIN,
                    "Fuel stop",
                    true,
                );
            }
        }
    }

    fn insert_pickup(&mut self) {
        self.ensure_cycle_capacity(PICKUP_DROPOFF_MIN);
        self.push_segment(
            SegmentKind::Pickup,
            DutyStatus::OnDutyNotDriving,
            PICKUP_DROPOFF_MIN,
            "Pickup (1 hr)",
            true,
        );
    }

    fn insert_dropoff(&mut self) {
        self.ensure_cycle_capacity(PICKUP_DROPOFF_MIN);
        self.push_segment(
            SegmentKind::Dropoff,
            DutyStatus::OnDutyNotDriving,
            PICKUP_DROPOFF_MIN,
            "Dropoff (1 hr)",
            true,
        );
    }
}

/// Split a leg into (miles, hours) pieces of at most one fuel interval
/// each. Duration is pro-rated by distance at the leg's implied speed.
fn split_leg_by_fuel(distance_miles: f64, duration_hours: f64) -> Vec<(f64, f64)> {
    if distance_miles <= 0.0 {
        return vec![(0.0, 0.0)];
    }

    let miles_per_hour = if duration_hours > 0.0 {
        distance_miles / duration_hours
    } else {
        0.0
    };

    let mut sub_segments = Vec::new();
    let mut miles_left = distance_miles;
    while miles_left > 0.0 {
        let segment_miles = miles_left.min(FUEL_INTERVAL_MILES);
        let segment_hours = if miles_per_hour > 0.0 {
            segment_miles / miles_per_hour
        } else {
            0.0
        };
        sub_segments.push((segment_miles, segment_hours));
        miles_left -= segment_miles;
    }

    sub_segments
}

/// Build the full trip timeline: drive to pickup, one hour of pickup
/// work, drive to dropoff, one hour of dropoff work, with fuel stops and
/// HOS interruptions interleaved. A route without legs degrades to a
/// single driving block.
pub fn build_timeline(request: &TripRequest, route: &Route) -> Vec<TimelineSegment> {
    let mut planner = TimelinePlanner::new(request);

    match route.legs.as_slice() {
        [] => {
            planner.drive_with_hos(0, route.duration_hours * 60.0, "Driving");
        }
        [leg0] => {
            planner.drive_leg(0, leg0, "Driving to pickup");
            planner.insert_pickup();
            planner.insert_dropoff();
        }
        [leg0, leg1, ..] => {
            planner.drive_leg(0, leg0, "Driving to pickup");
            planner.insert_pickup();
            planner.drive_leg(1, leg1, "Driving to dropoff");
            planner.insert_dropoff();
        }
    }

    planner.segments
}

// ===========================================================================
// Tests
// ===========================================================================
