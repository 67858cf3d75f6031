//! Error types for scheduling operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("Invalid time range: {0}")]
    InvalidTimeRange(String),

    #[error("Invalid day of week: {0} (expected 0-6, Sunday = 0)")]
    InvalidDayOfWeek(u8),

    #[error("Invalid recurrence: {0}")]
    InvalidRecurrence(String),

    #[error("Time block overlaps an existing time block: {0}")]
    TimeBlockOverlap(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Unknown tutor: {0}")]
    UnknownTutor(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid subscription: {0}")]
    InvalidSubscription(String),

    #[error("Slot taken: {0}")]
    SlotTaken(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
