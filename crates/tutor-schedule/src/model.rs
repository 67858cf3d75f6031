//! Tutor calendar data: recurring availability, one-off blocks, and bookings.

use chrono::{DateTime, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};
use crate::overlap::{Occupied, Span};
use crate::time_label::ClockTime;

/// A recurring weekly window during which a tutor takes sessions.
///
/// Times are tutor-local wall-clock times. `day_of_week` counts from
/// Sunday = 0 to Saturday = 6.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityWindow {
    pub day_of_week: u8,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl AvailabilityWindow {
    /// An active window, validated.
    ///
    /// # Errors
    ///
    /// [`ScheduleError::InvalidDayOfWeek`] if `day_of_week > 6`, or
    /// [`ScheduleError::InvalidTimeRange`] unless `start_time < end_time`.
    pub fn new(day_of_week: u8, start_time: ClockTime, end_time: ClockTime) -> Result<Self> {
        let window = Self {
            day_of_week,
            start_time,
            end_time,
            is_active: true,
        };
        window.validate()?;
        Ok(window)
    }

    pub fn validate(&self) -> Result<()> {
        if self.day_of_week > 6 {
            return Err(ScheduleError::InvalidDayOfWeek(self.day_of_week));
        }
        if self.start_time >= self.end_time {
            return Err(ScheduleError::InvalidTimeRange(format!(
                "End time must be after start time ({} - {})",
                self.start_time, self.end_time
            )));
        }
        Ok(())
    }

    /// Whether this window is active and recurs on `weekday`.
    pub fn applies_to(&self, weekday: Weekday) -> bool {
        self.is_active && u32::from(self.day_of_week) == weekday.num_days_from_sunday()
    }

    pub fn length_minutes(&self) -> u32 {
        self.end_time.minutes().saturating_sub(self.start_time.minutes())
    }
}

/// A one-off interval during which a tutor is unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBlock {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl TimeBlock {
    /// # Errors
    ///
    /// [`ScheduleError::InvalidTimeRange`] unless `start_time < end_time`.
    pub fn new(
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        reason: Option<String>,
    ) -> Result<Self> {
        let block = Self {
            start_time,
            end_time,
            reason,
        };
        block.validate()?;
        Ok(block)
    }

    pub fn validate(&self) -> Result<()> {
        if self.start_time >= self.end_time {
            return Err(ScheduleError::InvalidTimeRange(format!(
                "End time must be after start time ({} - {})",
                self.start_time.to_rfc3339(),
                self.end_time.to_rfc3339()
            )));
        }
        Ok(())
    }
}

impl Occupied for TimeBlock {
    fn span(&self) -> Span {
        Span::new(self.start_time, self.end_time)
    }
}

/// A session already on a tutor's calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookedSession {
    pub scheduled_at: DateTime<Utc>,
    /// Length in minutes.
    pub duration: u32,
}

impl Occupied for BookedSession {
    fn span(&self) -> Span {
        Span::from_minutes(self.scheduled_at, self.duration)
    }
}

/// Everything the resolver and planner need about one tutor, fetched in one go.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilitySnapshot {
    /// IANA zone the windows are expressed in. Falls back to the configured
    /// default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default)]
    pub availability: Vec<AvailabilityWindow>,
    #[serde(default)]
    pub booked: Vec<BookedSession>,
    #[serde(default)]
    pub time_blocks: Vec<TimeBlock>,
}

impl AvailabilitySnapshot {
    /// The snapshot's zone, or `fallback` if it has none.
    pub fn timezone_or(&self, fallback: &str) -> Result<Tz> {
        parse_timezone(self.timezone.as_deref().unwrap_or(fallback))
    }

    /// Bookings and time blocks as one occupied set.
    pub fn occupied(&self) -> Vec<Span> {
        self.booked
            .iter()
            .map(|b| b.span())
            .chain(self.time_blocks.iter().map(|b| b.span()))
            .collect()
    }
}

/// Parse an IANA timezone string into `Tz`.
pub fn parse_timezone(s: &str) -> Result<Tz> {
    s.parse::<Tz>()
        .map_err(|_| ScheduleError::InvalidTimezone(format!("'{s}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(s: &str) -> ClockTime {
        s.parse().unwrap()
    }

    #[test]
    fn test_window_rejects_inverted_range() {
        let err = AvailabilityWindow::new(1, t("17:00"), t("09:00")).unwrap_err();
        assert!(err.to_string().contains("End time must be after start time"), "got: {err}");
    }

    #[test]
    fn test_window_rejects_empty_range() {
        assert!(AvailabilityWindow::new(1, t("09:00"), t("09:00")).is_err());
    }

    #[test]
    fn test_window_rejects_bad_day() {
        assert_eq!(
            AvailabilityWindow::new(7, t("09:00"), t("10:00")).unwrap_err(),
            ScheduleError::InvalidDayOfWeek(7)
        );
    }

    #[test]
    fn test_window_applies_to_sunday_zero() {
        let sunday = AvailabilityWindow::new(0, t("09:00"), t("10:00")).unwrap();
        assert!(sunday.applies_to(Weekday::Sun));
        assert!(!sunday.applies_to(Weekday::Mon));
    }

    #[test]
    fn test_inactive_window_never_applies() {
        let mut w = AvailabilityWindow::new(1, t("09:00"), t("10:00")).unwrap();
        w.is_active = false;
        assert!(!w.applies_to(Weekday::Mon));
    }

    #[test]
    fn test_time_block_rejects_inverted_range() {
        let start = Utc.with_ymd_and_hms(2026, 3, 16, 12, 0, 0).unwrap();
        let err = TimeBlock::new(start, start, None).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidTimeRange(_)));
    }

    #[test]
    fn test_snapshot_deserializes_camel_case() {
        let json = r#"{
            "timezone": "America/New_York",
            "availability": [{"dayOfWeek": 1, "startTime": "09:00", "endTime": "17:00"}],
            "booked": [{"scheduledAt": "2026-03-16T14:00:00Z", "duration": 60}],
            "timeBlocks": [{"startTime": "2026-03-16T18:00:00Z", "endTime": "2026-03-16T19:00:00Z", "reason": "dentist"}]
        }"#;
        let snap: AvailabilitySnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.availability[0].start_time, t("09:00"));
        assert!(snap.availability[0].is_active);
        assert_eq!(snap.booked[0].duration, 60);
        assert_eq!(snap.time_blocks[0].reason.as_deref(), Some("dentist"));
        assert_eq!(snap.occupied().len(), 2);
        assert_eq!(snap.timezone_or("UTC").unwrap(), chrono_tz::America::New_York);
    }

    #[test]
    fn test_snapshot_timezone_fallback_and_error() {
        let snap = AvailabilitySnapshot::default();
        assert_eq!(snap.timezone_or("UTC").unwrap(), chrono_tz::UTC);
        let err = snap.timezone_or("Invalid/Zone").unwrap_err();
        assert!(err.to_string().contains("Invalid timezone"), "got: {err}");
    }
}
