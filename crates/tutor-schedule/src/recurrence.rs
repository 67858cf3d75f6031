//! Recurring session planning and conflict partitioning.
//!
//! A [`RecurrencePlan`] expands a chosen start into `count` occurrences, one
//! every 7 (weekly) or 14 (biweekly) calendar days. Each occurrence keeps the
//! base's local wall-clock time on its own date, so a 2:00 PM session stays at
//! 2:00 PM across a DST change even though the UTC instant moves by an hour.
//!
//! - A local time that does not exist (spring-forward gap) is shifted forward
//!   by the length of the gap.
//! - An ambiguous local time (fall-back) resolves to the earlier instant.
//!
//! [`partition_by_conflict`] splits occurrences into those that collide with
//! something already on the calendar and those that are free, preserving the
//! original order in both halves.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};
use crate::overlap::{overlaps_any, Occupied, Span};
use crate::time_label::{parse_time_label, ClockTime};

/// Most occurrences a single recurring booking may produce.
pub const MAX_OCCURRENCES: u32 = 52;

/// How often a booking repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// A single session.
    #[default]
    Once,
    /// Every 7 days.
    Weekly,
    /// Every 14 days.
    Biweekly,
}

impl Frequency {
    pub fn interval_days(self) -> i64 {
        match self {
            Frequency::Once => 0,
            Frequency::Weekly => 7,
            Frequency::Biweekly => 14,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Frequency::Once => "once",
            Frequency::Weekly => "weekly",
            Frequency::Biweekly => "biweekly",
        };
        f.write_str(s)
    }
}

impl FromStr for Frequency {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "once" | "none" => Ok(Frequency::Once),
            "weekly" => Ok(Frequency::Weekly),
            "biweekly" => Ok(Frequency::Biweekly),
            other => Err(ScheduleError::InvalidRecurrence(format!(
                "unknown frequency '{other}'"
            ))),
        }
    }
}

/// One projected session of a recurring booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
    /// Zero-based position in the series. Users see `index + 1`.
    pub index: usize,
    /// Tutor-local calendar date.
    pub date: NaiveDate,
    /// Absolute start instant.
    pub start: DateTime<Utc>,
}

impl Occurrence {
    pub fn number(&self) -> usize {
        self.index + 1
    }

    pub fn span(&self, duration_minutes: u32) -> Span {
        Span::from_minutes(self.start, duration_minutes)
    }
}

/// A validated recurrence request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrencePlan {
    base_date: NaiveDate,
    base_time: ClockTime,
    frequency: Frequency,
    count: u32,
}

impl RecurrencePlan {
    /// # Errors
    ///
    /// [`ScheduleError::InvalidRecurrence`] unless `1 <= count <= 52`.
    pub fn new(
        base_date: NaiveDate,
        base_time: ClockTime,
        frequency: Frequency,
        count: u32,
    ) -> Result<Self> {
        Self::with_max(base_date, base_time, frequency, count, MAX_OCCURRENCES)
    }

    /// Like [`RecurrencePlan::new`] with a caller-supplied upper bound. The
    /// bound can tighten [`MAX_OCCURRENCES`] but never raise it.
    ///
    /// # Errors
    ///
    /// [`ScheduleError::InvalidRecurrence`] for a count outside the bound, or
    /// a series whose last date is past the end of the calendar.
    pub fn with_max(
        base_date: NaiveDate,
        base_time: ClockTime,
        frequency: Frequency,
        count: u32,
        max_occurrences: u32,
    ) -> Result<Self> {
        let max = max_occurrences.min(MAX_OCCURRENCES);
        if count == 0 || count > max {
            return Err(ScheduleError::InvalidRecurrence(format!(
                "count must be between 1 and {max}, got {count}"
            )));
        }
        let last = match frequency {
            Frequency::Once => 0,
            _ => count - 1,
        };
        if occurrence_date(base_date, frequency, last).is_none() {
            return Err(ScheduleError::InvalidRecurrence(format!(
                "series starting {base_date} runs past the last representable date"
            )));
        }
        Ok(Self {
            base_date,
            base_time,
            frequency,
            count,
        })
    }

    pub fn base_date(&self) -> NaiveDate {
        self.base_date
    }

    pub fn base_time(&self) -> ClockTime {
        self.base_time
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    /// Number of occurrences the plan expands to. [`Frequency::Once`] is
    /// always a single session whatever count was requested.
    pub fn count(&self) -> u32 {
        match self.frequency {
            Frequency::Once => 1,
            _ => self.count,
        }
    }

    pub fn is_recurring(&self) -> bool {
        self.count() > 1
    }

    /// Expand into concrete occurrences, ascending by start.
    pub fn expand(&self, tz: &Tz) -> Vec<Occurrence> {
        (0..self.count())
            .map_while(|i| {
                let date = occurrence_date(self.base_date, self.frequency, i)?;
                let start = resolve_local(tz, date.and_time(self.base_time.to_naive_time()))?;
                Some(Occurrence {
                    index: i as usize,
                    date,
                    start,
                })
            })
            .collect()
    }
}

fn occurrence_date(base: NaiveDate, frequency: Frequency, index: u32) -> Option<NaiveDate> {
    base.checked_add_signed(Duration::days(
        frequency.interval_days() * i64::from(index),
    ))
}

/// Parse `base_time_label` and expand the series in one step.
///
/// # Errors
///
/// [`ScheduleError::InvalidTime`] for an unparseable label, or
/// [`ScheduleError::InvalidRecurrence`] for a count outside `[1, 52]`.
pub fn plan_recurrence(
    base_date: NaiveDate,
    base_time_label: &str,
    frequency: Frequency,
    count: u32,
    tz: &Tz,
) -> Result<Vec<Occurrence>> {
    let base_time = parse_time_label(base_time_label)?;
    let plan = RecurrencePlan::new(base_date, base_time, frequency, count)?;
    let occurrences = plan.expand(tz);
    tracing::debug!(
        %base_date,
        base_time = %base_time,
        %frequency,
        count = occurrences.len(),
        "expanded recurrence plan"
    );
    Ok(occurrences)
}

/// Map a tutor-local wall-clock time to an instant. `None` only at the very
/// edge of the representable range.
fn resolve_local(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earlier, _) => Some(earlier.with_timezone(&Utc)),
        LocalResult::None => {
            // Inside a gap: apply the offset in force before the transition,
            // which lands the same distance past the gap's end.
            let day_before = naive.checked_sub_signed(Duration::days(1))?;
            let before = tz.offset_from_utc_datetime(&day_before).fix().local_minus_utc();
            let utc = naive.checked_sub_signed(Duration::seconds(i64::from(before)))?;
            Some(Utc.from_utc_datetime(&utc))
        }
    }
}

/// How a conflict partition should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Resolution {
    /// Nothing collides; the whole series can be committed.
    NoConflict,
    /// Every occurrence collides; nothing can be committed.
    AllConflict,
    /// Some collide; the user must confirm booking the rest.
    PartialConflict,
}

/// Occurrences split by whether they collide with the occupied set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictSet {
    pub conflicts: Vec<Occurrence>,
    pub valid_sessions: Vec<Occurrence>,
}

impl ConflictSet {
    pub fn total(&self) -> usize {
        self.conflicts.len() + self.valid_sessions.len()
    }

    pub fn resolution(&self) -> Resolution {
        if self.conflicts.is_empty() {
            Resolution::NoConflict
        } else if self.valid_sessions.is_empty() {
            Resolution::AllConflict
        } else {
            Resolution::PartialConflict
        }
    }
}

/// Split `occurrences` into conflicting and free, keeping series order.
pub fn partition_by_conflict<O: Occupied>(
    occurrences: &[Occurrence],
    occupied: &[O],
    duration_minutes: u32,
) -> ConflictSet {
    let occupied: Vec<Span> = occupied.iter().map(O::span).collect();
    let (conflicts, valid_sessions): (Vec<Occurrence>, Vec<Occurrence>) = occurrences
        .iter()
        .copied()
        .partition(|o| overlaps_any(&o.span(duration_minutes), &occupied));

    let set = ConflictSet {
        conflicts,
        valid_sessions,
    };
    tracing::debug!(
        total = set.total(),
        conflicts = set.conflicts.len(),
        resolution = ?set.resolution(),
        "partitioned occurrences by conflict"
    );
    set
}
