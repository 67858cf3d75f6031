//! Bookable start times for one tutor on one calendar date.
//!
//! Candidate starts are sampled on a fixed grid (30 minutes by default)
//! from the start of each active window that recurs on the date's weekday.
//! A candidate survives when:
//!
//! - the session fits inside the window (`cursor + duration <= window end`),
//! - it starts strictly after `now`,
//! - it does not overlap any booking or time block.
//!
//! Only the start positions are grid-snapped. The fit and overlap tests use
//! the exact duration, so a 45-minute session on a 30-minute grid is handled
//! correctly.
//!
//! Windows are tutor-local wall-clock times and are interpreted in the
//! tutor's zone. A grid position that does not exist locally (spring-forward
//! gap) is skipped; an ambiguous one (fall-back) resolves to the earlier
//! instant.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::config::SchedulingConfig;
use crate::error::Result;
use crate::model::{AvailabilitySnapshot, AvailabilityWindow};
use crate::overlap::{overlaps_any, Occupied, Span};
use crate::time_label::ClockTime;

/// Default spacing between candidate starts.
pub const DEFAULT_SLOT_STEP_MINUTES: u32 = 30;

/// A start time a session of the requested length can be booked at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailableSlot {
    /// Tutor-local time of day.
    pub time: ClockTime,
    /// 12-hour display label, e.g. `"2:30 PM"`.
    pub label: String,
    /// Absolute start instant.
    pub start: DateTime<Utc>,
}

impl AvailableSlot {
    pub fn span(&self, duration_minutes: u32) -> Span {
        Span::from_minutes(self.start, duration_minutes)
    }
}

/// Compute bookable slots on `date` using the default 30-minute grid.
///
/// The result is deduplicated and sorted chronologically. An empty result
/// means nothing is bookable; this function never fails.
pub fn compute_available_slots<O: Occupied>(
    date: NaiveDate,
    windows: &[AvailabilityWindow],
    occupied: &[O],
    duration_minutes: u32,
    now: DateTime<Utc>,
    tz: &Tz,
) -> Vec<AvailableSlot> {
    compute_available_slots_with_step(
        date,
        windows,
        occupied,
        duration_minutes,
        now,
        tz,
        DEFAULT_SLOT_STEP_MINUTES,
    )
}

/// [`compute_available_slots`] with an explicit grid spacing.
///
/// A zero step is treated as one minute. Never panics, whatever the
/// duration or step.
pub fn compute_available_slots_with_step<O: Occupied>(
    date: NaiveDate,
    windows: &[AvailabilityWindow],
    occupied: &[O],
    duration_minutes: u32,
    now: DateTime<Utc>,
    tz: &Tz,
    step_minutes: u32,
) -> Vec<AvailableSlot> {
    let step = step_minutes.max(1);
    let weekday = date.weekday();
    let occupied: Vec<Span> = occupied.iter().map(O::span).collect();

    // Keyed by local time: dedupes starts produced by more than one window
    // and yields them in chronological order.
    let mut found: BTreeMap<ClockTime, AvailableSlot> = BTreeMap::new();
    let mut matching_windows = 0usize;

    for window in windows.iter().filter(|w| w.applies_to(weekday)) {
        matching_windows += 1;
        let window_end = window.end_time.minutes();
        let mut cursor = window.start_time.minutes();

        while cursor < window_end {
            let fits = cursor
                .checked_add(duration_minutes)
                .is_some_and(|end| end <= window_end);
            if fits {
                if let Some(slot) = candidate(date, cursor, duration_minutes, now, tz, &occupied) {
                    found.insert(slot.time, slot);
                }
            }
            cursor = cursor.saturating_add(step);
        }
    }

    tracing::debug!(
        %date,
        weekday = %weekday,
        windows = matching_windows,
        duration_minutes,
        slots = found.len(),
        "computed available slots"
    );

    found.into_values().collect()
}

/// Slots for a fetched snapshot, honouring the configured grid and zone.
///
/// # Errors
///
/// Returns [`crate::ScheduleError::InvalidTimezone`] if neither the snapshot
/// nor the config names a valid zone.
pub fn slots_for_snapshot(
    snapshot: &AvailabilitySnapshot,
    date: NaiveDate,
    duration_minutes: u32,
    now: DateTime<Utc>,
    config: &SchedulingConfig,
) -> Result<Vec<AvailableSlot>> {
    let tz = snapshot.timezone_or(&config.timezone)?;
    Ok(compute_available_slots_with_step(
        date,
        &snapshot.availability,
        &snapshot.occupied(),
        duration_minutes,
        now,
        &tz,
        config.slot_step_minutes,
    ))
}

fn candidate(
    date: NaiveDate,
    cursor: u32,
    duration_minutes: u32,
    now: DateTime<Utc>,
    tz: &Tz,
    occupied: &[Span],
) -> Option<AvailableSlot> {
    let time = ClockTime::from_minutes(cursor)?;
    let start = tz
        .from_local_datetime(&date.and_time(time.to_naive_time()))
        .earliest()?
        .with_timezone(&Utc);

    if start <= now {
        return None;
    }
    if overlaps_any(&Span::from_minutes(start, duration_minutes), occupied) {
        return None;
    }

    Some(AvailableSlot {
        time,
        label: time.label(),
        start,
    })
}
