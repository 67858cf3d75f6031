//! The shared booking-conflict predicate.
//!
//! Every interval in this crate is half-open: `[start, end)`. Two intervals
//! overlap when `a.start < b.end && b.start < a.end`, so a session ending at
//! 10:00 does not conflict with one starting at 10:00.
//!
//! The slot resolver and the recurrence conflict partition both call
//! [`Span::overlaps`] through the [`Occupied`] trait, so the two flows cannot
//! disagree about what counts as a conflict.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// A half-open absolute time interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Span {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// A span starting at `start` lasting `minutes`, clamped to the last
    /// representable instant.
    pub fn from_minutes(start: DateTime<Utc>, minutes: u32) -> Self {
        Self {
            start,
            end: start
                .checked_add_signed(Duration::minutes(i64::from(minutes)))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// Anything that blocks a stretch of a tutor's calendar.
pub trait Occupied {
    fn span(&self) -> Span;
}

impl Occupied for Span {
    fn span(&self) -> Span {
        *self
    }
}

/// `[a_start, a_start + a_minutes)` and `[b_start, b_start + b_minutes)` overlap.
pub fn overlaps(
    a_start: DateTime<Utc>,
    a_minutes: u32,
    b_start: DateTime<Utc>,
    b_minutes: u32,
) -> bool {
    Span::from_minutes(a_start, a_minutes).overlaps(&Span::from_minutes(b_start, b_minutes))
}

/// Whether `candidate` overlaps any of `occupied`.
pub fn overlaps_any<O: Occupied>(candidate: &Span, occupied: &[O]) -> bool {
    occupied.iter().any(|o| candidate.overlaps(&o.span()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 16, hour, min, 0).unwrap()
    }

    #[test]
    fn test_partial_overlap() {
        assert!(overlaps(at(9, 30), 60, at(10, 0), 60));
        assert!(overlaps(at(10, 0), 60, at(9, 30), 60));
    }

    #[test]
    fn test_adjacent_is_not_overlap() {
        assert!(!overlaps(at(9, 0), 60, at(10, 0), 60));
        assert!(!overlaps(at(10, 0), 60, at(9, 0), 60));
    }

    #[test]
    fn test_containment_is_overlap() {
        assert!(overlaps(at(9, 0), 180, at(10, 0), 30));
        assert!(overlaps(at(10, 0), 30, at(9, 0), 180));
    }

    #[test]
    fn test_identical_is_overlap() {
        assert!(overlaps(at(10, 0), 60, at(10, 0), 60));
    }

    #[test]
    fn test_disjoint() {
        assert!(!overlaps(at(8, 0), 30, at(11, 0), 30));
    }

    #[test]
    fn test_overlaps_any() {
        let busy = vec![Span::new(at(10, 0), at(11, 0)), Span::new(at(13, 0), at(14, 0))];
        assert!(overlaps_any(&Span::from_minutes(at(10, 30), 60), &busy));
        assert!(!overlaps_any(&Span::from_minutes(at(11, 0), 120), &busy));
        assert!(!overlaps_any::<Span>(&Span::from_minutes(at(11, 0), 120), &[]));
    }

    #[test]
    fn test_span_duration() {
        assert_eq!(Span::from_minutes(at(9, 0), 45).duration_minutes(), 45);
    }

    #[test]
    fn test_span_end_clamped_at_last_instant() {
        let span = Span::from_minutes(DateTime::<Utc>::MAX_UTC - Duration::minutes(5), 60);
        assert_eq!(span.end, DateTime::<Utc>::MAX_UTC);
    }
}
