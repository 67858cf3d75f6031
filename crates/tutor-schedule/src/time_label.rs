//! Wall-clock times of day and the 12-hour labels shown to users.
//!
//! A [`ClockTime`] is a minute of the day in the tutor's local calendar. It
//! serialises as fixed-width `"HH:MM"`, so lexicographic and numeric ordering
//! agree.
//!
//! [`parse_time_label`] is the one place a user-facing label such as
//! `"2:30 PM"` becomes a [`ClockTime`]. Both the single-booking path and the
//! recurrence path go through it, so the same label always resolves to the
//! same time.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};

const MINUTES_PER_DAY: u32 = 24 * 60;

/// A time of day with minute precision (`00:00` through `23:59`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(u16);

impl ClockTime {
    /// Build from an hour (0-23) and minute (0-59).
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self((hour * 60 + minute) as u16))
        } else {
            None
        }
    }

    /// Build from minutes since midnight.
    pub fn from_minutes(minutes: u32) -> Option<Self> {
        (minutes < MINUTES_PER_DAY).then_some(Self(minutes as u16))
    }

    pub fn minutes(self) -> u32 {
        u32::from(self.0)
    }

    pub fn hour(self) -> u32 {
        self.minutes() / 60
    }

    pub fn minute(self) -> u32 {
        self.minutes() % 60
    }

    pub fn to_naive_time(self) -> NaiveTime {
        // Always in range: hour < 24 and minute < 60 by construction.
        NaiveTime::from_hms_opt(self.hour(), self.minute(), 0).unwrap_or(NaiveTime::MIN)
    }

    /// The 12-hour display label, e.g. `"9:00 AM"` or `"2:30 PM"`.
    pub fn label(self) -> String {
        format_time_label(self)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for ClockTime {
    type Err = ScheduleError;

    /// Strict 24-hour `HH:MM`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ScheduleError::InvalidTime(format!("'{s}': expected HH:MM"));

        let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
        if h.len() != 2 || m.len() != 2 {
            return Err(invalid());
        }
        let hour: u32 = h.parse().map_err(|_| invalid())?;
        let minute: u32 = m.parse().map_err(|_| invalid())?;
        Self::from_hm(hour, minute).ok_or_else(invalid)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = ScheduleError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<ClockTime> for String {
    fn from(t: ClockTime) -> Self {
        t.to_string()
    }
}

/// Parse a time label into a [`ClockTime`].
///
/// Accepts 12-hour labels with an `AM`/`PM` suffix in any case, with or
/// without a space and with or without minutes (`"2:30 PM"`, `"2:30pm"`,
/// `"2 PM"`), and plain 24-hour `"14:30"`.
///
/// `12 AM` is midnight and `12 PM` is noon.
///
/// # Errors
///
/// Returns [`ScheduleError::InvalidTime`] for anything else, including
/// `"13 PM"` and `"0:30 AM"`.
///
/// # Examples
///
/// ```
/// use tutor_schedule::time_label::parse_time_label;
///
/// let t = parse_time_label("2:30 PM").unwrap();
/// assert_eq!((t.hour(), t.minute()), (14, 30));
/// assert_eq!(parse_time_label("12 AM").unwrap().hour(), 0);
/// ```
pub fn parse_time_label(label: &str) -> Result<ClockTime> {
    let invalid = || ScheduleError::InvalidTime(format!("'{}'", label.trim()));

    let compact = label.trim().to_ascii_lowercase().replace(' ', "");
    let (time_part, is_pm) = if let Some(t) = compact.strip_suffix("pm") {
        (t, Some(true))
    } else if let Some(t) = compact.strip_suffix("am") {
        (t, Some(false))
    } else {
        (compact.as_str(), None)
    };

    let (hour_str, minute_str) = match time_part.split_once(':') {
        Some((h, m)) => (h, Some(m)),
        None => (time_part, None),
    };
    if hour_str.is_empty() || hour_str.len() > 2 {
        return Err(invalid());
    }
    let hour: u32 = hour_str.parse().map_err(|_| invalid())?;
    let minute: u32 = match minute_str {
        Some(m) if m.len() == 2 => m.parse().map_err(|_| invalid())?,
        Some(_) => return Err(invalid()),
        None => 0,
    };

    let hour24 = match is_pm {
        Some(pm) => {
            if !(1..=12).contains(&hour) {
                return Err(invalid());
            }
            match (hour, pm) {
                (12, true) => 12,
                (12, false) => 0,
                (h, true) => h + 12,
                (h, false) => h,
            }
        }
        // 24-hour form needs explicit minutes.
        None if minute_str.is_some() => hour,
        None => return Err(invalid()),
    };

    ClockTime::from_hm(hour24, minute).ok_or_else(invalid)
}

/// Format a [`ClockTime`] as a 12-hour label, e.g. `"2:30 PM"`.
pub fn format_time_label(time: ClockTime) -> String {
    let (hour12, suffix) = match time.hour() {
        0 => (12, "AM"),
        h @ 1..=11 => (h, "AM"),
        12 => (12, "PM"),
        h => (h - 12, "PM"),
    };
    format!("{}:{:02} {}", hour12, time.minute(), suffix)
}
