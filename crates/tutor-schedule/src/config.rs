//! Tunables for slot computation and recurrence planning.

use serde::Deserialize;

use crate::error::{Result, ScheduleError};
use crate::recurrence::MAX_OCCURRENCES;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SchedulingConfig {
    /// Grid spacing, in minutes, for candidate slot starts within a window.
    pub slot_step_minutes: u32,
    /// Upper bound on occurrences in one recurring booking; may only lower
    /// [`MAX_OCCURRENCES`].
    pub max_occurrences: u32,
    /// Session length used when a caller does not supply one.
    pub default_duration_minutes: u32,
    /// IANA zone for snapshots that do not carry their own.
    pub timezone: String,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            slot_step_minutes: 30,
            max_occurrences: 52,
            default_duration_minutes: 60,
            timezone: "UTC".to_string(),
        }
    }
}

impl SchedulingConfig {
    /// # Errors
    ///
    /// Returns an error if the step or duration is zero, `max_occurrences` is
    /// outside `[1, MAX_OCCURRENCES]`, or the timezone is unknown.
    pub fn validate(&self) -> Result<()> {
        if self.slot_step_minutes == 0 {
            return Err(ScheduleError::InvalidRecurrence(
                "slot_step_minutes must be positive".to_string(),
            ));
        }
        if self.max_occurrences == 0 || self.max_occurrences > MAX_OCCURRENCES {
            return Err(ScheduleError::InvalidRecurrence(format!(
                "max_occurrences must be between 1 and {MAX_OCCURRENCES}, got {}",
                self.max_occurrences
            )));
        }
        if self.default_duration_minutes == 0 {
            return Err(ScheduleError::InvalidRecurrence(
                "default_duration_minutes must be positive".to_string(),
            ));
        }
        crate::model::parse_timezone(&self.timezone)?;
        Ok(())
    }
}
